use crate::report::{PairSummary, SummaryData, format_f64_6};

pub fn render_report_text(data: &SummaryData) -> String {
    let mut out = String::new();

    out.push_str("Raw Correlation Function Report\n");
    out.push_str("===============================\n\n");

    out.push_str("1. Run\n");
    out.push_str(&format!("Tool: {} {}\n", data.tool.name, data.tool.version));
    out.push_str(&format!("Input: {}\n", data.input));
    out.push_str(&format!("Output: {}\n\n", data.output));

    out.push_str("2. Settings\n");
    out.push_str(&format!("Normalization: {}\n", data.normalization));
    out.push_str(&format!("Target bin width: {} MeV\n", data.binwidth_mev));
    out.push_str(&format!("Combination regions: {}\n", data.region_policy));
    out.push_str(&format!(
        "Femto region: [{}, {}]\n\n",
        data.femto_region[0], data.femto_region[1]
    ));

    out.push_str("3. Correlation functions\n");
    out.push_str("pair\tregion\trebin\tnorm\tnorm_rew\tfemto_pairs\tmult_slices\n");
    for p in &data.pairs {
        out.push_str(&format_row(p));
        out.push('\n');
    }

    let empty: Vec<&PairSummary> = data
        .pairs
        .iter()
        .filter(|p| p.norm == 0.0 || p.norm_rew == 0.0)
        .collect();
    if !empty.is_empty() {
        out.push_str("\n4. Caveats\n");
        for p in empty {
            out.push_str(&format!(
                "Empty normalization window for {} {}; CF set to zero.\n",
                p.pair, p.region
            ));
        }
    }

    out
}

fn format_row(p: &PairSummary) -> String {
    let slices = match (p.filled_slices, p.mult_slices) {
        (Some(filled), Some(total)) => format!("{filled}/{total}"),
        _ => "-".to_string(),
    };
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
        p.pair,
        p.region,
        p.rebin,
        format_f64_6(p.norm),
        format_f64_6(p.norm_rew),
        p.femto_pairs,
        slices
    )
}
