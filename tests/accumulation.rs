use temporal_aa::harness::{HarnessOpts, run_cpu};
use temporal_aa::taa::config::TaaCfg;

#[test]
fn accumulation_lowers_edge_error() {
    let report = run_cpu(&HarnessOpts::default(), &TaaCfg::default()).expect("run");
    assert_eq!(report.resolved, 32);
    assert_eq!(report.passthrough, 0);
    let first = report.first_error().expect("first");
    let last = report.final_error().expect("last");
    assert!(first > 0.0, "pattern should alias at 1 spp");
    assert!(last < first, "edge error did not drop: {first} -> {last}");
    assert_eq!(report.leaked, 0);
}

#[test]
fn toggling_mixes_resolved_and_passthrough_frames() {
    let opts = HarnessOpts {
        frames: 20,
        toggle_every: 5,
        ..HarnessOpts::default()
    };
    let report = run_cpu(&opts, &TaaCfg::default()).expect("run");
    assert_eq!(report.resolved, 10);
    assert_eq!(report.passthrough, 10);
    assert_eq!(report.dropped, 0);
    // Inactive frames are plain copies of the un-jittered draw.
    assert_eq!(report.errors[5], report.errors[15]);
    assert_eq!(report.errors[5], report.errors[9]);
    assert_eq!(report.leaked, 0);
}

#[test]
fn starting_inactive_passes_every_frame_through() {
    let cfg = TaaCfg {
        start_active: Some(false),
        ..TaaCfg::default()
    };
    let opts = HarnessOpts {
        frames: 6,
        ..HarnessOpts::default()
    };
    let report = run_cpu(&opts, &cfg).expect("run");
    assert_eq!(report.passthrough, 6);
    assert!(report.errors.windows(2).all(|w| w[0] == w[1]));
}
