use glam::Vec4;
use taa_core::cpu::CpuBackend;
use taa_core::history::HISTORY_LABEL;
use taa_core::{BufferDesc, GpuBackend, HistoryBuffer, PixelFormat};

fn frame(gpu: &mut CpuBackend, w: u32, h: u32, value: f32) -> taa_core::cpu::CpuBuffer {
    let desc = BufferDesc::new(w, h, PixelFormat::Rgba16Float);
    let texels = vec![Vec4::splat(value); (w * h) as usize];
    gpu.create_with(desc, "frame.source", &texels).expect("source")
}

#[test]
fn at_most_one_live_history_across_resizes() {
    let mut gpu = CpuBackend::new();
    let mut history = HistoryBuffer::<CpuBackend>::new();
    let sizes = [(64, 32), (64, 32), (128, 72), (32, 32), (32, 32), (1920, 1080), (8, 8)];
    for (w, h) in sizes {
        let src = frame(&mut gpu, w, h, 0.5);
        let hist = history.ensure(&mut gpu, &src).expect("ensure");
        let d = gpu.describe(hist).expect("describe");
        assert_eq!((d.width, d.height), (w, h));
        assert_eq!(gpu.live_count(HISTORY_LABEL), 1);
        gpu.release(src);
    }
    assert_eq!(gpu.peak_count(HISTORY_LABEL), 1);
    history.release(&mut gpu);
    assert_eq!(gpu.live_count(HISTORY_LABEL), 0);
}

#[test]
fn new_history_is_seeded_from_source() {
    let mut gpu = CpuBackend::new();
    let mut history = HistoryBuffer::<CpuBackend>::new();
    let src = frame(&mut gpu, 4, 4, 0.75);
    let hist = history.ensure(&mut gpu, &src).expect("ensure");
    assert!(gpu.read(hist).unwrap().iter().all(|v| *v == Vec4::splat(0.75)));
}

#[test]
fn matching_source_keeps_existing_contents() {
    let mut gpu = CpuBackend::new();
    let mut history = HistoryBuffer::<CpuBackend>::new();
    let first = frame(&mut gpu, 4, 4, 0.1);
    history.ensure(&mut gpu, &first).expect("ensure");
    let second = frame(&mut gpu, 4, 4, 0.9);
    let hist = history.ensure(&mut gpu, &second).expect("ensure");
    // Same extent/format: no reseed, so the first frame is still there.
    assert!(gpu.read(hist).unwrap().iter().all(|v| *v == Vec4::splat(0.1)));
}

#[test]
fn format_change_reallocates() {
    let mut gpu = CpuBackend::new();
    let mut history = HistoryBuffer::<CpuBackend>::new();
    let hdr = frame(&mut gpu, 4, 4, 0.5);
    history.ensure(&mut gpu, &hdr).expect("ensure");
    let ldr = gpu
        .allocate(BufferDesc::new(4, 4, PixelFormat::Rgba8Unorm), "frame.source")
        .expect("ldr");
    history.ensure(&mut gpu, &ldr).expect("ensure");
    assert_eq!(history.desc().map(|d| d.format), Some(PixelFormat::Rgba8Unorm));
    assert_eq!(gpu.live_count(HISTORY_LABEL), 1);
}

#[test]
fn release_without_buffer_is_noop() {
    let mut gpu = CpuBackend::new();
    let mut history = HistoryBuffer::<CpuBackend>::new();
    history.release(&mut gpu);
    history.release(&mut gpu);
    assert!(!history.is_allocated());
    assert_eq!(gpu.live_total(), 0);
}
