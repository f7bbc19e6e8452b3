use approx::assert_relative_eq;
use render_wgpu::gfx::pipeline::resolve_source;
use render_wgpu::gfx::types::ResolveUniforms;
use taa_core::BlendPolicy;

#[test]
fn wgsl_uniform_fields_follow_rust_order() {
    let src = resolve_source();
    let start = src.find("struct ResolveUniforms").expect("uniform struct");
    let body = &src[start..src[start..].find("};").map(|e| start + e).expect("struct end")];
    let fields: Vec<&str> = body
        .lines()
        .filter_map(|l| l.trim().split_once(':').map(|(name, _)| name.trim()))
        .collect();
    assert_eq!(
        fields,
        ["jitter_uv", "texel_size", "history_weight", "clamp_gamma", "has_motion", "_pad"]
    );
}

#[test]
fn uniforms_carry_policy_and_texel_size() {
    let policy = BlendPolicy {
        history_weight: 0.8,
        clamp_gamma: 1.5,
    };
    let u = ResolveUniforms::new(glam::Vec2::new(0.001, 0.002), 200, 100, policy, true);
    assert_relative_eq!(u.texel_size[0], 0.005);
    assert_relative_eq!(u.texel_size[1], 0.01);
    assert_relative_eq!(u.jitter_uv[1], 0.002);
    assert_eq!(u.history_weight, 0.8);
    assert_eq!(u.clamp_gamma, 1.5);
    assert_eq!(u.has_motion, 1);
    let bytes = bytemuck::bytes_of(&u);
    assert_eq!(bytes.len(), 32);
}
