use crate::report::SummaryData;

pub fn render_summary_json(data: &SummaryData) -> std::io::Result<String> {
    serde_json::to_string_pretty(data).map_err(std::io::Error::other)
}
