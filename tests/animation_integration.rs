//! Integration tests for the animation and draw-planning pipeline
//!
//! This module drives `draw::prepare` the way a renderer would, tic by
//! tic, against a registry with a stub file source and a recording GPU
//! device:
//! - Sticky single-attempt asset loading across repeated draws
//! - Fallback resolution and super-key stripping through the full path
//! - Frame-pair selection and duration clamping across state boundaries

use image::{ImageOutputFormat, Rgba, RgbaImage};
use modeltint::anim::{keys, AnimKey, FallbackContext, FallbackTable, FrameSet};
use modeltint::cache::{ColormapId, RampBlender, RemapTable};
use modeltint::draw::{prepare, DrawInputs, DrawPlan, TintFlags};
use modeltint::interp::{InterpolationMode, INTERPOLATION_LIMIT};
use modeltint::ramp::RampTable;
use modeltint::registry::{FileSource, ModelDef, ModelRegistry};
use modeltint::texture::RecordingDevice;
use std::collections::HashMap;
use std::io::Cursor;

// ============================================================================
// Test Utilities
// ============================================================================

/// File source over a fixed map, counting every lookup.
#[derive(Default)]
struct CountingSource {
    files: HashMap<String, Vec<u8>>,
    lookups: HashMap<String, usize>,
}

impl CountingSource {
    fn with_texture(name: &str) -> Self {
        let mut source = Self::default();
        source.files.insert(format!("models/{name}.png"), png_bytes());
        source
    }

    fn lookup_count(&self, name: &str) -> usize {
        self.lookups.get(name).copied().unwrap_or(0)
    }
}

impl FileSource for CountingSource {
    fn read(&mut self, name: &str) -> Option<Vec<u8>> {
        *self.lookups.entry(name.to_string()).or_insert(0) += 1;
        self.files.get(name).cloned()
    }
}

fn png_bytes() -> Vec<u8> {
    let img = RgbaImage::from_fn(4, 4, |x, y| {
        Rgba([(x * 60) as u8, (y * 60) as u8, 90, 255])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageOutputFormat::Png).unwrap();
    out.into_inner()
}

fn registry_with_skin() -> ModelRegistry {
    let mut reg = ModelRegistry::new();
    reg.register_skin_model(&ModelDef {
        name: "sonic".to_string(),
        filename: "sonic.md3".to_string(),
        scale: 3.0,
        offset: 0.0,
    });
    reg.ramps
        .load_jsonl(r##"{ name: "ruby", ramp: ["#FF6060", "#E05050", "#C04040", "#A03030", "#802020", "#601010", "#400000", "#300000"] }"##)
        .expect("test ramp parses");
    let slot = reg.skin_model_mut("sonic").unwrap();
    slot.frames.insert(keys::STAND, FrameSet { frames: vec![10, 11], interpolate: true });
    slot.frames.insert(keys::WALK, FrameSet { frames: vec![20, 21, 22, 23], interpolate: true });
    slot.frames.insert(keys::SPRING, FrameSet { frames: vec![30], interpolate: false });
    reg
}

fn inputs(key: AnimKey, frame: u32) -> DrawInputs<'static> {
    DrawInputs {
        tint: TintFlags::default(),
        color: None,
        colormap: ColormapId(0),
        remap: None,
        key,
        frame,
        elapsed: 0.5,
        duration: 4.0,
        mode: InterpolationMode::Tagged,
        ends_on_last: false,
        successor_in_family: true,
        ctx: FallbackContext::default(),
    }
}

fn run(
    reg: &mut ModelRegistry,
    source: &mut CountingSource,
    device: &mut RecordingDevice,
    inputs: &DrawInputs,
) -> Option<DrawPlan> {
    let mut blender = RampBlender;
    let ramps = reg.ramps.clone();
    let fallbacks = FallbackTable::new();
    let slot = reg.skin_model_mut("sonic").unwrap();
    prepare(slot, &ramps, &fallbacks, inputs, source, device, &mut blender)
}

// ============================================================================
// Sticky asset loading
// ============================================================================

#[test]
fn test_missing_texture_attempted_once_across_draws() {
    let mut reg = registry_with_skin();
    let mut source = CountingSource::default();
    let mut device = RecordingDevice::new();

    for frame in 0..10 {
        let plan = run(&mut reg, &mut source, &mut device, &inputs(keys::WALK, frame));
        assert!(plan.is_none());
    }
    assert_eq!(source.lookup_count("models/sonic.png"), 1);
    assert!(device.set_calls.is_empty());
}

#[test]
fn test_missing_blend_still_draws_untinted() {
    let mut reg = registry_with_skin();
    let mut source = CountingSource::with_texture("sonic");
    let mut device = RecordingDevice::new();

    for frame in 0..10 {
        let plan = run(&mut reg, &mut source, &mut device, &inputs(keys::WALK, frame));
        assert!(plan.is_some());
    }
    assert_eq!(source.lookup_count("models/sonic.png"), 1);
    assert_eq!(source.lookup_count("models/sonic_blend.png"), 1);
    assert_eq!(device.set_calls.len(), 10);
}

// ============================================================================
// Fallback resolution through the full path
// ============================================================================

#[test]
fn test_unauthored_key_walks_default_chain() {
    let mut reg = registry_with_skin();
    let mut source = CountingSource::with_texture("sonic");
    let mut device = RecordingDevice::new();

    // RUN has no frames; the default chain lands on WALK.
    let plan = run(&mut reg, &mut source, &mut device, &inputs(keys::RUN, 0)).unwrap();
    assert_eq!(plan.frame, 20);
}

#[test]
fn test_jump_context_selects_spring() {
    let mut reg = registry_with_skin();
    let mut source = CountingSource::with_texture("sonic");
    let mut device = RecordingDevice::new();

    let mut inp = inputs(keys::JUMP, 0);
    inp.ctx = FallbackContext { no_jump_spin: true, can_swim: false };
    let plan = run(&mut reg, &mut source, &mut device, &inp).unwrap();
    assert_eq!(plan.frame, 30);
}

#[test]
fn test_super_key_strips_to_base_frames() {
    let mut reg = registry_with_skin();
    let mut source = CountingSource::with_texture("sonic");
    let mut device = RecordingDevice::new();

    let plan = run(&mut reg, &mut source, &mut device, &inputs(keys::WALK.with_super(), 1)).unwrap();
    assert_eq!(plan.frame, 21);
}

#[test]
fn test_super_frames_used_when_authored() {
    let mut reg = registry_with_skin();
    {
        let slot = reg.skin_model_mut("sonic").unwrap();
        slot.frames.insert(
            keys::WALK.with_super(),
            FrameSet { frames: vec![40, 41], interpolate: true },
        );
    }
    let mut source = CountingSource::with_texture("sonic");
    let mut device = RecordingDevice::new();

    let plan = run(&mut reg, &mut source, &mut device, &inputs(keys::WALK.with_super(), 0)).unwrap();
    assert_eq!(plan.frame, 40);
}

#[test]
fn test_cyclic_fallback_map_skips_model() {
    let mut reg = registry_with_skin();
    let mut source = CountingSource::with_texture("sonic");
    let mut device = RecordingDevice::new();
    let mut blender = RampBlender;

    let mut fallbacks = FallbackTable::new();
    fallbacks.set(keys::RIDE, keys::FLOAT);
    fallbacks.set(keys::FLOAT, keys::RIDE);
    let ramps = reg.ramps.clone();
    let slot = reg.skin_model_mut("sonic").unwrap();
    let plan = prepare(
        slot,
        &ramps,
        &fallbacks,
        &inputs(keys::RIDE, 0),
        &mut source,
        &mut device,
        &mut blender,
    );
    assert!(plan.is_none());
}

// ============================================================================
// Frame-pair selection
// ============================================================================

#[test]
fn test_frame_counter_wraps_and_pairs() {
    let mut reg = registry_with_skin();
    let mut source = CountingSource::with_texture("sonic");
    let mut device = RecordingDevice::new();

    // WALK has four frames; counter 6 is position 2.
    let plan = run(&mut reg, &mut source, &mut device, &inputs(keys::WALK, 6)).unwrap();
    assert_eq!(plan.frame, 22);
    assert_eq!(plan.next_frame, Some(23));

    // Last position wraps to the first frame within the family.
    let plan = run(&mut reg, &mut source, &mut device, &inputs(keys::WALK, 7)).unwrap();
    assert_eq!(plan.frame, 23);
    assert_eq!(plan.next_frame, Some(20));
}

#[test]
fn test_untagged_set_does_not_interpolate() {
    let mut reg = registry_with_skin();
    let mut source = CountingSource::with_texture("sonic");
    let mut device = RecordingDevice::new();

    let plan = run(&mut reg, &mut source, &mut device, &inputs(keys::SPRING, 0)).unwrap();
    assert_eq!(plan.frame, 30);
    assert_eq!(plan.next_frame, None);
}

#[test]
fn test_long_state_duration_clamped_for_interpolation() {
    let mut reg = registry_with_skin();
    let mut source = CountingSource::with_texture("sonic");
    let mut device = RecordingDevice::new();

    let mut inp = inputs(keys::WALK, 0);
    inp.duration = 100.0;
    inp.elapsed = 1.0;
    let plan = run(&mut reg, &mut source, &mut device, &inp).unwrap();
    assert_eq!(plan.next_frame, Some(21));
    assert_eq!(plan.duration, INTERPOLATION_LIMIT);
}

// ============================================================================
// Tinted draws end to end
// ============================================================================

#[test]
fn test_rainbow_draw_activates_generated_texture() {
    let mut reg = registry_with_skin();
    let mut source = CountingSource::with_texture("sonic");
    source.files.insert(
        "models/sonic_blend.png".to_string(),
        png_bytes(),
    );
    let mut device = RecordingDevice::new();

    let mut bytes = [0u8; 256];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = 255 - i as u8;
    }
    let remap = RemapTable::new(bytes);
    let mut inp = inputs(keys::WALK, 0);
    inp.tint = TintFlags { has_color: true, colorized: true, ..TintFlags::default() };
    inp.color = Some("ruby");
    inp.colormap = ColormapId(3);
    inp.remap = Some(&remap);

    let plan = run(&mut reg, &mut source, &mut device, &inp);
    assert!(plan.is_some());
    assert_eq!(device.set_calls.len(), 1);
    assert_eq!(reg.skin_model("sonic").unwrap().cache.len(), 1);
}

#[test]
fn test_unload_all_resets_caches() {
    let mut reg = registry_with_skin();
    let mut source = CountingSource::with_texture("sonic");
    let mut device = RecordingDevice::new();

    run(&mut reg, &mut source, &mut device, &inputs(keys::WALK, 0)).unwrap();
    reg.unload_all();
    assert!(reg.skin_model("sonic").unwrap().texture().is_none());

    // A fresh session loads again.
    run(&mut reg, &mut source, &mut device, &inputs(keys::WALK, 0)).unwrap();
    assert_eq!(source.lookup_count("models/sonic.png"), 2);
}
