//! GPU-backed end-to-end coverage for the concrete scenarios in `spec.md`
//! §8. Requires a real `wgpu::Device`, so these are gated behind the
//! `gpu-tests` feature (run with `cargo test --features gpu-tests`) and
//! skipped on CI/dev machines without a usable adapter.
#![cfg(feature = "gpu-tests")]

use std::sync::Arc;

use framepace::gpu::{GpuContext, GpuTexture, TextureKind};
use framepace::{FrameGenSettings, FrameGenerator};

const W: u32 = 64;
const H: u32 = 64;

async fn gpu_context() -> GpuContext {
    GpuContext::request_standalone().await.expect("no compatible GPU adapter available for gpu-tests")
}

fn upload(gpu: &GpuContext, pixels: &[u8], width: u32, height: u32, label: &str) -> GpuTexture {
    let texture = GpuTexture::allocate(gpu, TextureKind::Color, width, height, label);
    gpu.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    texture
}

fn solid(gpu: &GpuContext, width: u32, height: u32, bgra: [u8; 4], label: &str) -> GpuTexture {
    let mut pixels = vec![0u8; (width * height * 4) as usize];
    for px in pixels.chunks_exact_mut(4) {
        px.copy_from_slice(&bgra);
    }
    upload(gpu, &pixels, width, height, label)
}

/// A horizontal ramp, `value(x) = (base_x + x) % 256`, replicated down every
/// row and across all three color channels, alpha fixed at 255. Shifting
/// `base_x` by `dx` simulates a rigid horizontal pan.
fn ramp(gpu: &GpuContext, width: u32, height: u32, base_x: i32, label: &str) -> GpuTexture {
    let mut pixels = vec![0u8; (width * height * 4) as usize];
    for y in 0..height {
        for x in 0..width {
            let v = (base_x + x as i32).rem_euclid(256) as u8;
            let offset = ((y * width + x) * 4) as usize;
            pixels[offset] = v;
            pixels[offset + 1] = v;
            pixels[offset + 2] = v;
            pixels[offset + 3] = 255;
        }
    }
    upload(gpu, &pixels, width, height, label)
}

/// Reads a `Bgra8Unorm` texture back into a tightly-packed `width*height*4`
/// byte buffer, handling `wgpu`'s row-pitch alignment requirement.
fn readback(gpu: &GpuContext, texture: &GpuTexture) -> Vec<u8> {
    let width = texture.width;
    let height = texture.height;
    let unpadded_bytes_per_row = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

    let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback"),
        size: u64::from(padded_bytes_per_row) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("readback-copy") });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &texture.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    gpu.queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    slice.map_async(wgpu::MapMode::Read, |_| {});
    gpu.device.poll(wgpu::PollType::wait_indefinitely()).expect("device poll failed");

    let padded = slice.get_mapped_range();
    let mut out = vec![0u8; (unpadded_bytes_per_row * height) as usize];
    for row in 0..height as usize {
        let src = &padded[row * padded_bytes_per_row as usize..][..unpadded_bytes_per_row as usize];
        out[row * unpadded_bytes_per_row as usize..][..unpadded_bytes_per_row as usize].copy_from_slice(src);
    }
    drop(padded);
    buffer.unmap();
    out
}

/// Scenario 1: black-on-black static input. Output must stay all-zero.
#[test]
fn black_on_black_static_produces_black_output() {
    pollster::block_on(async {
        let gpu = gpu_context().await;
        let prev = solid(&gpu, W, H, [0, 0, 0, 255], "prev-black");
        let curr = solid(&gpu, W, H, [0, 0, 0, 255], "curr-black");

        let mut generator = FrameGenerator::initialize(Arc::clone(&gpu.device), Arc::clone(&gpu.queue), W, H, W, H);
        generator
            .set_settings(FrameGenSettings {
                multiplier: 2,
                ..FrameGenSettings::default()
            })
            .unwrap();
        generator.execute(&prev, &curr, 0.5).unwrap();

        let pixels = readback(&gpu, generator.output_texture());
        for (i, channel) in pixels.iter().enumerate() {
            // Alpha channel (every 4th byte) is opaque; color channels must
            // stay exactly zero with no motion and no difference input.
            if i % 4 != 3 {
                assert_eq!(*channel, 0, "non-zero color byte at offset {i}");
            }
        }
    });
}

/// Alpha-boundary property: `execute(prev, curr, 0)` matches `prev` and
/// `execute(prev, curr, 1)` matches `curr`, to within one bilinear texel.
#[test]
fn alpha_boundaries_match_their_endpoint_frame() {
    pollster::block_on(async {
        let gpu = gpu_context().await;
        let prev = ramp(&gpu, W, H, 0, "prev-ramp");
        let curr = ramp(&gpu, W, H, 8, "curr-ramp");

        let mut generator = FrameGenerator::initialize(Arc::clone(&gpu.device), Arc::clone(&gpu.queue), W, H, W, H);

        generator.execute(&prev, &curr, 0.0).unwrap();
        let at_zero = readback(&gpu, generator.output_texture());
        let expected_prev = readback(&gpu, &prev);
        assert_close(&at_zero, &expected_prev, 2);

        generator.execute(&prev, &curr, 1.0).unwrap();
        let at_one = readback(&gpu, generator.output_texture());
        let expected_curr = readback(&gpu, &curr);
        assert_close(&at_one, &expected_curr, 2);
    });
}

/// Scenario 6: minimal-pipeline mode on a rigid pan should closely track
/// the full pipeline's output (mean error within a few LSB, no pixel
/// outside the halo bound).
#[test]
fn minimal_pipeline_tracks_full_pipeline_on_a_rigid_pan() {
    pollster::block_on(async {
        let gpu = gpu_context().await;
        let prev = ramp(&gpu, W, H, 0, "prev-pan");
        let curr = ramp(&gpu, W, H, 8, "curr-pan");

        let mut full = FrameGenerator::initialize(Arc::clone(&gpu.device), Arc::clone(&gpu.queue), W, H, W, H);
        full.execute(&prev, &curr, 0.5).unwrap();
        let full_pixels = readback(&gpu, full.output_texture());

        let mut minimal = FrameGenerator::initialize(Arc::clone(&gpu.device), Arc::clone(&gpu.queue), W, H, W, H);
        minimal
            .set_settings(FrameGenSettings {
                minimal_pipeline: true,
                ..FrameGenSettings::default()
            })
            .unwrap();
        minimal.execute(&prev, &curr, 0.5).unwrap();
        let minimal_pixels = readback(&gpu, minimal.output_texture());

        let prev_pixels = readback(&gpu, &prev);
        let curr_pixels = readback(&gpu, &curr);

        let mut total_error = 0u64;
        let mut samples = 0u64;
        for i in 0..full_pixels.len() {
            if i % 4 == 3 {
                continue; // alpha channel
            }
            let a = f64::from(full_pixels[i]);
            let b = f64::from(minimal_pixels[i]);
            total_error += (a - b).unsigned_abs() as u64;
            samples += 1;

            let lo = f64::from(prev_pixels[i].min(curr_pixels[i]));
            let hi = f64::from(prev_pixels[i].max(curr_pixels[i]));
            let range = hi - lo;
            assert!(
                b >= lo - 0.5 * range - 1.0 && b <= hi + 0.5 * range + 1.0,
                "minimal-pipeline output {b} outside halo bound [{}, {}]",
                lo - 0.5 * range,
                hi + 0.5 * range
            );
        }
        let mean_error = total_error as f64 / samples as f64;
        assert!(mean_error <= 4.0, "mean minimal-pipeline error {mean_error} exceeds tolerance");
    });
}

fn assert_close(actual: &[u8], expected: &[u8], tolerance: i32) {
    for (i, (a, b)) in actual.iter().zip(expected.iter()).enumerate() {
        let diff = i32::from(*a) - i32::from(*b);
        assert!(diff.abs() <= tolerance, "byte {i}: {a} vs {b} exceeds tolerance {tolerance}");
    }
}
