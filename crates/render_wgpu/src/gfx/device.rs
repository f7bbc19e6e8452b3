//! Headless device creation for offscreen runs (harness, CI smoke checks).

use anyhow::Context;

use crate::gfx::backend::WgpuBackend;

fn backend_from_env() -> Option<wgpu::Backends> {
    match std::env::var("TAA_BACKEND").ok().as_deref() {
        Some("vulkan" | "VULKAN" | "vk") => Some(wgpu::Backends::VULKAN),
        Some("gl" | "GL" | "opengl") => Some(wgpu::Backends::GL),
        Some("metal" | "METAL") => Some(wgpu::Backends::METAL),
        Some("dx12" | "DX12") => Some(wgpu::Backends::DX12),
        Some("primary" | "PRIMARY" | "all") => Some(wgpu::Backends::PRIMARY),
        _ => None,
    }
}

/// Pick the first adapter that answers across candidate backends and open a device on it.
pub async fn headless() -> anyhow::Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
    let candidates: &[wgpu::Backends] = if let Some(b) = backend_from_env() {
        if b == wgpu::Backends::PRIMARY {
            &[wgpu::Backends::PRIMARY]
        } else {
            &[b, wgpu::Backends::PRIMARY]
        }
    } else {
        &[wgpu::Backends::PRIMARY, wgpu::Backends::GL]
    };

    let mut picked = None;
    for &backends in candidates {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let opts = wgpu::RequestAdapterOptions {
            compatible_surface: None,
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
        };
        if let Ok(adapter) = instance.request_adapter(&opts).await {
            picked = Some(adapter);
            break;
        }
    }
    let adapter = picked
        .ok_or_else(|| anyhow::anyhow!("no GPU adapter across backends {candidates:?}"))?;
    let info = adapter.get_info();
    log::info!("Adapter: {:?} ({:?})", info.name, info.backend);

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("taa-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::default(),
        })
        .await
        .context("request device")?;
    // Log validation instead of panicking
    device.on_uncaptured_error(Box::new(|e| {
        log::error!("wgpu uncaptured error: {e:?}");
    }));
    Ok((adapter, device, queue))
}

/// Headless device wrapped in a backend that knows the adapter's format caps.
pub async fn headless_backend() -> anyhow::Result<WgpuBackend> {
    let (adapter, device, queue) = headless().await?;
    Ok(WgpuBackend::new(&adapter, device, queue))
}
