use rand::{SeedableRng, rngs::StdRng};

use super::*;
use crate::{job::spec::JobSpec, params::resolve_job};

fn params(seed: i64, strength: f32) -> GenerationParameters {
    let job = JobSpec {
        prompt: "cat".to_string(),
        width: 8,
        height: 4,
        seed,
        strength,
        ..JobSpec::default()
    };
    resolve_job(&job, &mut StdRng::seed_from_u64(0))
        .unwrap()
        .params
}

#[test]
fn output_has_requested_size_and_is_deterministic() {
    let mut engine = PreviewEngine::new();
    let a = engine.txt2img(&params(5, 0.0)).unwrap();
    let b = engine.txt2img(&params(5, 0.0)).unwrap();
    assert_eq!(a.as_bytes().len(), 8 * 4 * 3);
    assert_eq!(a, b);
    assert_eq!(engine.calls(), 2);
}

#[test]
fn different_seeds_paint_different_images() {
    let mut engine = PreviewEngine::new();
    let a = engine.txt2img(&params(1, 0.0)).unwrap();
    let b = engine.txt2img(&params(2, 0.0)).unwrap();
    assert_ne!(a, b);
}

#[test]
fn zero_strength_img2img_keeps_start_image() {
    let mut engine = PreviewEngine::new();
    let start = RgbBuffer::new(8, 4, vec![100; 8 * 4 * 3]).unwrap();
    let out = engine.img2img(&start, &params(3, 0.0)).unwrap();
    assert_eq!(out, start);
}

#[test]
fn img2img_rejects_mismatched_start() {
    let mut engine = PreviewEngine::new();
    let start = RgbBuffer::new(2, 2, vec![0; 12]).unwrap();
    assert!(engine.img2img(&start, &params(3, 0.5)).is_err());
}
