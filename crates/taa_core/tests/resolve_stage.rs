use glam::{Vec2, Vec4};
use taa_core::cpu::{CpuBackend, CpuBuffer};
use taa_core::history::HISTORY_LABEL;
use taa_core::resolve::TEMPORARY_LABEL;
use taa_core::{
    BlendPolicy, BufferDesc, GpuBackend, HistoryBuffer, PassthroughReason, PixelFormat,
    ReprojectionStage, ResolveOutcome,
};

const DESC: BufferDesc = BufferDesc::new(8, 4, PixelFormat::Rgba16Float);

fn gradient(gpu: &mut CpuBackend) -> CpuBuffer {
    let texels: Vec<Vec4> = (0..32)
        .map(|i| Vec4::new(i as f32 / 31.0, 0.25, 1.0 - i as f32 / 31.0, 1.0))
        .collect();
    gpu.create_with(DESC, "frame.source", &texels).expect("source")
}

#[test]
fn missing_material_passes_source_through_bit_identical() {
    let mut gpu = CpuBackend::without_resolve();
    let mut stage = ReprojectionStage::<CpuBackend>::new(BlendPolicy::default());
    let mut history = HistoryBuffer::new();
    let src = gradient(&mut gpu);
    let dst = gpu.allocate(DESC, "frame.output").unwrap();

    let out = stage.resolve(&mut gpu, &mut history, &src, None, &dst, Vec2::new(0.5, 0.3));
    assert_eq!(out, ResolveOutcome::Passthrough(PassthroughReason::Unsupported));

    let a = gpu.read(&src).unwrap();
    let b = gpu.read(&dst).unwrap();
    assert!(
        a.iter()
            .zip(b)
            .all(|(x, y)| x.to_array().map(f32::to_bits) == y.to_array().map(f32::to_bits))
    );
    assert!(!history.is_allocated());
    assert_eq!(gpu.live_count(TEMPORARY_LABEL), 0);
}

#[test]
fn material_lookup_is_cached() {
    let mut gpu = CpuBackend::without_resolve();
    let mut stage = ReprojectionStage::<CpuBackend>::default();
    let mut history = HistoryBuffer::new();
    let src = gradient(&mut gpu);
    let dst = gpu.allocate(DESC, "frame.output").unwrap();
    for _ in 0..5 {
        stage.resolve(&mut gpu, &mut history, &src, None, &dst, Vec2::ZERO);
    }
    assert_eq!(gpu.material_lookups(), 1);
}

#[test]
fn resolve_writes_output_and_history_and_frees_scratch() {
    let mut gpu = CpuBackend::new();
    let mut stage = ReprojectionStage::<CpuBackend>::default();
    let mut history = HistoryBuffer::new();
    let src = gradient(&mut gpu);
    let dst = gpu.allocate(DESC, "frame.output").unwrap();

    let out = stage.resolve(&mut gpu, &mut history, &src, None, &dst, Vec2::ZERO);
    assert_eq!(out, ResolveOutcome::Resolved);
    assert_eq!(gpu.live_count(TEMPORARY_LABEL), 0);
    assert_eq!(gpu.peak_count(TEMPORARY_LABEL), 1);
    assert_eq!(gpu.live_count(HISTORY_LABEL), 1);

    // First frame: history seeded from the source, zero jitter -> output == source.
    let s = gpu.read(&src).unwrap().to_vec();
    let o = gpu.read(&dst).unwrap().to_vec();
    let h = gpu.read(history.get().unwrap()).unwrap().to_vec();
    for ((a, b), c) in s.iter().zip(&o).zip(&h) {
        assert!((*a - *b).abs().max_element() < 1e-5);
        assert_eq!(b, c);
    }
}

#[test]
fn failed_resolve_releases_scratch_and_passes_through() {
    let mut gpu = CpuBackend::new();
    let mut stage = ReprojectionStage::<CpuBackend>::default();
    let mut history = HistoryBuffer::new();
    let src = gradient(&mut gpu);
    let dst = gpu.allocate(DESC, "frame.output").unwrap();

    gpu.fail_resolves(1);
    let out = stage.resolve(&mut gpu, &mut history, &src, None, &dst, Vec2::ZERO);
    assert_eq!(out, ResolveOutcome::Passthrough(PassthroughReason::ResolveFailed));
    assert_eq!(gpu.live_count(TEMPORARY_LABEL), 0);
    assert!(!history.is_allocated());
    assert_eq!(gpu.read(&src).unwrap(), gpu.read(&dst).unwrap());

    // Next frame recovers.
    let out = stage.resolve(&mut gpu, &mut history, &src, None, &dst, Vec2::ZERO);
    assert_eq!(out, ResolveOutcome::Resolved);
}

#[test]
fn mismatched_destination_drops_frame() {
    let mut gpu = CpuBackend::without_resolve();
    let mut stage = ReprojectionStage::<CpuBackend>::default();
    let mut history = HistoryBuffer::new();
    let src = gradient(&mut gpu);
    let dst = gpu
        .allocate(BufferDesc::new(2, 2, PixelFormat::Rgba16Float), "frame.output")
        .unwrap();
    let out = stage.resolve(&mut gpu, &mut history, &src, None, &dst, Vec2::ZERO);
    assert_eq!(out, ResolveOutcome::Dropped);
}

#[test]
fn source_from_another_backend_is_dropped_without_history() {
    let mut owner = CpuBackend::new();
    let _a = gradient(&mut owner);
    let _b = gradient(&mut owner);
    let foreign = gradient(&mut owner);

    let mut gpu = CpuBackend::new();
    let mut stage = ReprojectionStage::<CpuBackend>::default();
    let mut history = HistoryBuffer::new();
    let dst = gpu.allocate(DESC, "frame.output").unwrap();
    assert!(gpu.describe(&foreign).is_err());

    let out = stage.resolve(&mut gpu, &mut history, &foreign, None, &dst, Vec2::ZERO);
    assert_eq!(out, ResolveOutcome::Dropped);
    assert!(!history.is_allocated());
    assert_eq!(gpu.live_count(HISTORY_LABEL), 0);
    assert_eq!(gpu.live_count(TEMPORARY_LABEL), 0);
}
