use std::path::Path;

use tracing::{debug, info};

use crate::input::{Container, Object};
use crate::pipeline::AnalysisError;
use crate::pipeline::stage2_reweight::Stage2Output;
use crate::pipeline::stage5_cf::Stage5Output;

/// Lays out the per-pair results under `{pair}/{region}/...`, the
/// multiplicity slices under `{pair}/{region}/multbins/{i}/...` and the
/// femto-pairs table at the top level.
pub fn build_output_container(
    name: &str,
    stage2: &Stage2Output,
    stage5: &Stage5Output,
) -> Result<Container, AnalysisError> {
    let mut out = Container::new(name);

    for (pair, regions) in &stage2.reweighted {
        for (region, result) in regions {
            for (i_slice, (se, me, cf)) in result.slices.iter().enumerate() {
                debug!("writing {} {} slice {}", pair, region, i_slice);
                let dir = format!("{pair}/{region}/multbins/{i_slice}");
                out.insert(
                    &format!("{dir}/hCF_multbin{i_slice}"),
                    Object::Th1(cf.clone().renamed(format!("hCF_multbin{i_slice}"))),
                )?;
                out.insert(
                    &format!("{dir}/hSE_multbin{i_slice}"),
                    Object::Th1(se.clone().renamed(format!("hSE_multbin{i_slice}"))),
                )?;
                out.insert(
                    &format!("{dir}/hME_multbin{i_slice}"),
                    Object::Th1(me.clone().renamed(format!("hME_multbin{i_slice}"))),
                )?;
            }
        }
    }

    for (pair, regions) in &stage5.cfs {
        for (region, cf) in regions {
            let dir = format!("{pair}/{region}");
            for h in [&cf.se, &cf.me, &cf.me_rew, &cf.weights, &cf.cf, &cf.cf_rew] {
                out.insert(&format!("{dir}/{}", h.name), Object::Th1(h.clone()))?;
            }
        }
    }

    out.insert("hFemtoPairs", Object::Th2(stage5.femto_pairs.clone()))?;
    Ok(out)
}

pub fn run_stage6(
    path: &Path,
    stage2: &Stage2Output,
    stage5: &Stage5Output,
) -> Result<Container, AnalysisError> {
    let container = build_output_container(&path.display().to_string(), stage2, stage5)?;
    container.save(path)?;
    info!("output saved in {}", path.display());
    Ok(container)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_write.rs"]
mod tests;
