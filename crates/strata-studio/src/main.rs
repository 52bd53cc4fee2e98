use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};

use strata_engine::backend::HeadlessBackend;
use strata_engine::context::{NativeContext, SurfaceHandle, VSyncMode};
use strata_engine::fatal::FatalHandler;
use strata_engine::graphics::{CameraDesc, Graphics, GraphicsInit, ShaderSource, ShaderStage, TextureData, TextureFormat};
use strata_engine::input::platform::winit::translate_window_event;
use strata_engine::input::{InputFrame, InputState};
use strata_engine::logging::{init_logging, LoggingConfig};
use strata_engine::text::FontSystem;
use strata_ui::prelude::*;
use winit::dpi::PhysicalPosition;
use winit::event::{DeviceId, ElementState, MouseScrollDelta, TouchPhase, WindowEvent};

const VIEWPORT: Viewport = Viewport::new(820.0, 560.0);

/// Scripted frames are written in physical pixels at this DPI scale.
const SCALE_FACTOR: f64 = 2.0;

const QUAD_VS: &str = r#"
#version 330 core
layout(location = 0) in vec2 aPos;
layout(location = 1) in vec2 aUv;
uniform mat4 uModel;
uniform mat4 uProjection;
out vec2 vUv;
void main() {
    vUv = aUv;
    gl_Position = uProjection * uModel * vec4(aPos, 0.0, 1.0);
}
"#;

const QUAD_FS: &str = r#"
#version 330 core
in vec2 vUv;
uniform vec3 uColor;
uniform float uOpacity;
uniform sampler2D uTexture;
uniform bool uUseTexture;
out vec4 fragColor;
void main() {
    vec4 base = uUseTexture ? texture(uTexture, vUv) : vec4(1.0);
    fragColor = vec4(uColor, uOpacity) * base;
}
"#;

/// Font candidates tried when neither `STRATA_FONT` nor an argument names one.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
];

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let fatal = FatalHandler::new(|e| log::error!(target: "studio", "{e}"));
    let mut gfx = Graphics::new(HeadlessBackend::new(), GraphicsInit::default(), fatal)
        .context("graphics initialization failed")?;

    let native = NativeContext::from_raw(0x1).context("invalid native context")?;
    let surface = SurfaceHandle::from_raw(0x1).context("invalid surface")?;
    let ctx = gfx.create_context(Some(native))?;
    gfx.make_current(ctx, surface)?;
    gfx.set_vsync(ctx, VSyncMode::On)?;

    let shader = gfx.create_shader(
        ctx,
        "quad",
        &[
            ShaderSource::inline(ShaderStage::Vertex, QUAD_VS),
            ShaderSource::inline(ShaderStage::Fragment, QUAD_FS),
        ],
    )?;

    let camera = gfx.create_camera(ctx, CameraDesc::default())?;
    if let Some(cam) = gfx.camera_mut(camera) {
        cam.set_aspect_from_size(VIEWPORT.width as u32, VIEWPORT.height as u32);
    }

    let mut scene = UiScene::new(
        &gfx,
        ctx,
        SceneConfig {
            default_shader: Some(shader),
            ..SceneConfig::default()
        },
    )?;

    // ── layout ────────────────────────────────────────────────────────────

    let panel = scene.create_image(&mut gfx, "panel", Vec2::zero(), Vec2::new(360.0, 240.0))?;
    if let Some(w) = scene.widget_mut(panel) {
        w.anchor_to_viewport(VIEWPORT, Anchor::Center, Vec2::zero());
        w.set_color_rgb8(32, 36, 48);
        w.set_clipping(true);
    }

    let button = scene.create_image(&mut gfx, "launch", Vec2::new(0.0, 60.0), Vec2::new(160.0, 40.0))?;
    scene.set_parent(button, panel)?;

    let checker = checkerboard(8);
    let badge_tex = gfx.create_texture(
        ctx,
        "badge",
        TextureData {
            width: 8,
            height: 8,
            format: TextureFormat::Rgba8,
            pixels: &checker,
        },
    )?;
    let badge = scene.create_image(&mut gfx, "badge", Vec2::new(-140.0, -80.0), Vec2::new(32.0, 32.0))?;
    scene.set_parent(badge, panel)?;
    scene.set_texture(&gfx, badge, Some(badge_tex))?;
    if let Some(w) = scene.widget_mut(badge) {
        w.set_hit_target(HitTarget::Texture);
        w.set_opacity(0.8);
    }

    let clicks = Rc::new(Cell::new(0u32));
    if let Some(w) = scene.widget_mut(button) {
        w.set_color(0.2, 0.6, 1.0);
        let counter = Rc::clone(&clicks);
        w.events_mut().set_mouse_event(ActionTarget::Released, MouseButton::Left, move |e| {
            counter.set(counter.get() + 1);
            log::info!(target: "studio", "launch released at {:?}", e.pointer);
        })?;
        w.events_mut().set_hover_event(|e| log::debug!(target: "studio", "hovering ({})", e.widget));
        w.events_mut().set_key_event(ActionTarget::Pressed, Key::Enter, |_| {
            log::info!(target: "studio", "launch triggered from keyboard");
        })?;
    }
    if let Some(w) = scene.widget_mut(panel) {
        w.events_mut().set_scroll_event(|e| {
            log::info!(target: "studio", "panel scrolled by {:?}", e.scroll_delta);
        });
    }

    let mut fonts = FontSystem::new();
    match load_font_bytes() {
        Some((path, bytes)) => {
            let font = fonts.load_font(&mut gfx, "body", &bytes, 18.0)?;
            let mut pen = Vec2::new(24.0, 40.0);
            for ch in "Strata".chars() {
                let index = fonts.font(font).map(|f| f.glyph_index(ch)).unwrap_or(0);
                let name = format!("glyph-{ch}");
                let glyph = scene.create_text(&mut gfx, &fonts, &name, font, index, pen)?;
                if let Some(WidgetKind::Text(visual)) = scene.widget(glyph).map(|w| *w.kind()) {
                    pen.x += visual.advance;
                }
            }
            log::info!(target: "studio", "title set in {}", path.display());
        }
        None => log::warn!(target: "studio", "no font found; skipping title text"),
    }

    // ── frames ────────────────────────────────────────────────────────────

    let center = VIEWPORT.center();
    let button_pos = scene.aabb(button)?.center();
    let script: [Vec<WindowEvent>; 4] = [
        vec![cursor_moved(center)],
        vec![
            cursor_moved(button_pos),
            mouse_input(ElementState::Pressed),
        ],
        vec![mouse_input(ElementState::Released)],
        vec![
            cursor_moved(center),
            WindowEvent::MouseWheel {
                device_id: device(),
                delta: MouseScrollDelta::LineDelta(0.0, -1.0),
                phase: TouchPhase::Moved,
            },
        ],
    ];

    let mut state = InputState::new();
    let mut frame = InputFrame::new();
    for (n, events) in script.iter().enumerate() {
        frame.clear();
        for ev in events {
            if let Some(ev) = translate_window_event(SCALE_FACTOR, &state, ev) {
                state.apply_event(&mut frame, ev);
            }
        }
        if let Some(cam) = gfx.camera_mut(camera) {
            cam.rotate(frame.pointer_delta, 0.1);
        }

        let fired = scene.poll_events(&gfx, &state, &frame);
        let drawn = scene.render_all(&mut gfx, surface, VIEWPORT.projection())?;
        gfx.swap_buffers(ctx, surface)?;
        gfx.check_errors("frame");
        log::info!(
            target: "studio",
            "frame {n}: {} event(s), {drawn} widget(s) drawn",
            fired.len()
        );
    }
    log::info!(target: "studio", "launch clicked {} time(s)", clicks.get());

    // ── teardown ──────────────────────────────────────────────────────────

    scene.clear(&mut gfx);
    gfx.destroy_context(ctx)?;
    let pending = gfx.drain_errors();
    if !pending.is_empty() {
        log::warn!(target: "studio", "backend errors at shutdown: {pending}");
    }
    log::info!(
        target: "studio",
        "presented {} frame(s); {} texture(s) and {} mesh(es) still live",
        gfx.backend().presents(),
        gfx.backend().live_textures(),
        gfx.backend().live_meshes()
    );
    Ok(())
}

fn device() -> DeviceId {
    // SAFETY: the id is only carried through translation, never handed to the platform.
    unsafe { DeviceId::dummy() }
}

/// Cursor at logical position `p`.
fn cursor_moved(p: Vec2) -> WindowEvent {
    WindowEvent::CursorMoved {
        device_id: device(),
        position: PhysicalPosition::new(p.x as f64 * SCALE_FACTOR, p.y as f64 * SCALE_FACTOR),
    }
}

fn mouse_input(state: ElementState) -> WindowEvent {
    WindowEvent::MouseInput {
        device_id: device(),
        state,
        button: winit::event::MouseButton::Left,
    }
}

/// RGBA checkerboard with transparent dark cells.
fn checkerboard(size: u32) -> Vec<u8> {
    (0..size * size)
        .flat_map(|i| {
            let (x, y) = (i % size, i / size);
            if (x + y) % 2 == 0 {
                [255, 255, 255, 255]
            } else {
                [0, 0, 0, 0]
            }
        })
        .collect()
}

/// Font from `STRATA_FONT`, the first argument, or a well-known system path.
fn load_font_bytes() -> Option<(PathBuf, Vec<u8>)> {
    let explicit = std::env::var_os("STRATA_FONT")
        .map(PathBuf::from)
        .or_else(|| std::env::args_os().nth(1).map(PathBuf::from));

    explicit
        .into_iter()
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from))
        .find_map(|path| std::fs::read(&path).ok().map(|bytes| (path, bytes)))
}
