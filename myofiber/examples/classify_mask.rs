//! Labels a binary fiber mask, classifies its regions and prints the fibers.
//!
//! ```text
//! cargo run -p myofiber --example classify_mask -- mask.png [scale] [out_dir]
//! ```
//!
//! Nonzero pixels of `mask.png` are foreground. The rule thresholds label
//! every region, a logistic classifier is trained on those labels and then
//! relabels the image with the legacy override rules applied. The
//! classifications, the training rows and an RGB overlay are written to
//! `out_dir` (default `output`).

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use common::bit_buffer2::BitBuffer2;
use common::log_setup::setup_logging;
use myofiber::{OverrideRule, Session, SessionConfig};
use tracing::info;

fn load_mask(path: &Path) -> anyhow::Result<BitBuffer2> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open mask {}", path.display()))?
        .to_luma8();
    let (width, height) = img.dimensions();
    Ok(BitBuffer2::from_fn(width as usize, height as usize, |x, y| {
        img.get_pixel(x as u32, y as u32).0[0] != 0
    }))
}

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(mask_path) = args.next().map(PathBuf::from) else {
        bail!("usage: classify_mask <mask.png> [scale] [out_dir]");
    };
    let scale: f64 = match args.next() {
        Some(s) => s.parse().with_context(|| format!("Invalid scale '{s}'"))?,
        None => 1.0,
    };
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| "output".to_string()));

    setup_logging("info", "logs")?;
    std::fs::create_dir_all(&out_dir)?;

    let mask = load_mask(&mask_path)?;
    let config = SessionConfig {
        overrides: OverrideRule::legacy_defaults(),
        scale_factor: scale,
        ..Default::default()
    };
    let mut session = Session::new(&mask, config);
    if session.num_regions() == 0 {
        bail!("{} has no foreground regions", mask_path.display());
    }

    session.apply_rules()?;
    let rule_states = session.states().to_vec();
    session.export_training_data(&out_dir.join("training_data.json"))?;

    let classifier = session.train()?;
    if let Some(report) = classifier.coefficient_report() {
        info!("{report}");
    }
    let overridden = session.predict()?;
    info!(overridden, "Applied override rules");

    let agreement = session.compare(&rule_states)?;
    println!(
        "Rules vs classifier: precision {:?}, recall {:?}, f1 {:?}",
        agreement.precision(),
        agreement.recall(),
        agreement.f1()
    );

    session.save_classifications(&out_dir.join("classifications.json"))?;

    let overlay = session.overlay();
    image::RgbImage::from_fn(overlay.width() as u32, overlay.height() as u32, |x, y| {
        image::Rgb(overlay[(x as usize, y as usize)])
    })
    .save(out_dir.join("overlay.png"))?;

    println!("Area\tEccentricity\tConvexity\tCircularity\tRegion\tMinorAxisLength");
    for row in session.fiber_rows()? {
        println!(
            "{:.3}\t{:.3}\t{:.3}\t{:.3}\t{}\t{:.3}",
            row.area,
            row.eccentricity,
            row.convexity,
            row.circularity,
            row.region,
            row.minor_axis_length
        );
    }
    Ok(())
}
