//! The scene/render lifecycle manager: winit event loop, continuous render
//! loop, async model loads with stale-generation discard, material
//! recomposition, environment control, and snapshot export.
//!
//! All scene mutation happens on the event thread. Async work (asset loads,
//! texture decodes) runs on a tokio runtime (native) or via `spawn_local`
//! (wasm) and reports back through the winit `EventLoopProxy` as tagged user
//! events, so a completion can always be checked against the generation that
//! dispatched it.

use std::{iter, sync::Arc};

use anyhow::{Result, anyhow};
use cgmath::{Quaternion, Rad, Rotation3};
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    compositor,
    context::Context,
    data_structures::{
        instance::Instance,
        material::{MaterialSpec, TextureSource},
        node::{NodeData, SceneNode, TARGET_EXTENT},
    },
    environment::{EnvironmentState, FogSettings},
    render,
    resources::{self, ModelDescriptor},
    snapshot,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Per-frame idle rotation applied to the active model, in radians.
pub const IDLE_SPIN: f32 = 0.005;

/// Commands the embedding layer sends into the running viewer.
#[derive(Debug)]
pub enum ViewerInput {
    /// Replace the active model wholesale.
    SetModel(ModelDescriptor),
    /// Switch the material preset; geometry and texture are kept.
    SetMaterial(MaterialSpec),
    /// Bind or clear the texture input; triggers an async decode.
    SetTexture(Option<TextureSource>),
    SetLightIntensity(f32),
    SetBackground([f32; 3]),
    SetFog(Option<FogSettings>),
    SetGrid(bool),
    /// Replace the whole environment at once; only changed fields apply.
    SetEnvironment(EnvironmentState),
    /// Capture the current frame as a PNG.
    Snapshot,
    /// Invoke the external exporter callback, if one is configured.
    Export,
    /// Dispose the viewer and exit the event loop.
    Exit,
}

/// User events on the winit loop: external inputs plus async completions.
#[derive(Debug)]
pub enum ViewerEvent {
    Input(ViewerInput),
    /// wasm-only: the async mount finished and hands over the context.
    Mounted(Context),
    ModelLoaded {
        generation: u64,
        result: Result<NodeData>,
    },
    TextureDecoded {
        epoch: u64,
        result: Result<image::DynamicImage>,
    },
}

/// Cloneable sender for driving a running viewer from the outside.
#[derive(Clone, Debug)]
pub struct ViewerHandle {
    proxy: EventLoopProxy<ViewerEvent>,
}

impl ViewerHandle {
    fn send(&self, input: ViewerInput) -> Result<()> {
        self.proxy
            .send_event(ViewerEvent::Input(input))
            .map_err(|_| anyhow!("viewer event loop is closed"))
    }

    pub fn set_model(&self, descriptor: ModelDescriptor) -> Result<()> {
        self.send(ViewerInput::SetModel(descriptor))
    }

    pub fn set_material(&self, spec: MaterialSpec) -> Result<()> {
        self.send(ViewerInput::SetMaterial(spec))
    }

    pub fn set_texture(&self, source: Option<TextureSource>) -> Result<()> {
        self.send(ViewerInput::SetTexture(source))
    }

    pub fn set_light_intensity(&self, intensity: f32) -> Result<()> {
        self.send(ViewerInput::SetLightIntensity(intensity))
    }

    pub fn set_background(&self, rgb: [f32; 3]) -> Result<()> {
        self.send(ViewerInput::SetBackground(rgb))
    }

    pub fn set_fog(&self, fog: Option<FogSettings>) -> Result<()> {
        self.send(ViewerInput::SetFog(fog))
    }

    pub fn show_grid(&self, visible: bool) -> Result<()> {
        self.send(ViewerInput::SetGrid(visible))
    }

    pub fn snapshot(&self) -> Result<()> {
        self.send(ViewerInput::Snapshot)
    }

    pub fn export(&self) -> Result<()> {
        self.send(ViewerInput::Export)
    }

    pub fn exit(&self) -> Result<()> {
        self.send(ViewerInput::Exit)
    }
}

/// Startup configuration handed to [`run`].
pub struct ViewerConfig {
    pub title: String,
    pub model: ModelDescriptor,
    pub material: MaterialSpec,
    pub texture: Option<TextureSource>,
    pub environment: EnvironmentState,
    /// External model exporter. The viewer only triggers it; exporting
    /// itself is the embedder's concern.
    pub exporter: Option<Box<dyn FnMut(Option<&SceneNode>)>>,
    /// Called with a [`ViewerHandle`] before the event loop starts.
    pub on_handle: Option<Box<dyn FnOnce(ViewerHandle)>>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "verseview".to_string(),
            model: ModelDescriptor::default(),
            material: MaterialSpec::default(),
            texture: None,
            environment: EnvironmentState::default(),
            exporter: None,
            on_handle: None,
        }
    }
}

/// Viewer lifecycle. Events arriving outside `Active` are discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initializing,
    Active,
    Disposed,
}

/// Monotonic generation counter for async completions. A completion is only
/// applied when its captured generation is still the newest one and the
/// tracker has not been disposed.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoadTracker {
    current: u64,
    disposed: bool,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new load, invalidating every earlier generation.
    pub fn begin(&mut self) -> u64 {
        self.current += 1;
        self.current
    }

    pub fn is_current(&self, generation: u64) -> bool {
        !self.disposed && generation == self.current
    }

    /// Invalidate all generations, past and future.
    pub fn dispose(&mut self) {
        self.disposed = true;
    }
}

/// Everything that exists only while the viewer is mounted.
struct ViewerState {
    ctx: Context,
    scene: Option<SceneNode>,
    descriptor: ModelDescriptor,
    material: MaterialSpec,
    texture: Option<TextureSource>,
    /// Last successfully decoded texture image, reused on recomposition.
    decoded: Option<image::DynamicImage>,
    loads: LoadTracker,
    texture_epochs: LoadTracker,
    spin: f32,
    is_surface_configured: bool,
}

pub struct Viewer {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<ViewerEvent>,
    config: ViewerConfig,
    phase: Phase,
    state: Option<ViewerState>,
    last_time: Instant,
}

impl Viewer {
    fn new(event_loop: &EventLoop<ViewerEvent>, config: ViewerConfig) -> Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            phase: Phase::Uninitialized,
            state: None,
            last_time: Instant::now(),
        })
    }

    /// Finish mounting once the context exists: adopt the configured
    /// environment, kick off the initial model load and texture decode.
    fn finish_mount(&mut self, mut ctx: Context) {
        ctx.environment.apply(&ctx.queue, self.config.environment);

        self.state = Some(ViewerState {
            ctx,
            scene: None,
            descriptor: self.config.model.clone(),
            material: self.config.material,
            texture: self.config.texture.clone(),
            decoded: None,
            loads: LoadTracker::new(),
            texture_epochs: LoadTracker::new(),
            spin: 0.0,
            is_surface_configured: false,
        });
        self.phase = Phase::Active;

        let descriptor = self.config.model.clone();
        self.dispatch_load(descriptor);
        if let Some(source) = self.config.texture.clone() {
            self.dispatch_texture_decode(source);
        }

        if let Some(state) = &self.state {
            state.ctx.window.request_redraw();
        }
    }

    /// Spawn an asset load tagged with a fresh generation.
    fn dispatch_load(&mut self, descriptor: ModelDescriptor) {
        let Some(state) = &mut self.state else { return };
        let generation = state.loads.begin();
        state.descriptor = descriptor.clone();
        log::info!("loading model {:?} (generation {})", descriptor, generation);

        let proxy = self.proxy.clone();
        let task = async move {
            let result = resources::load_node_graph(&descriptor)
                .await
                .map(|graph| graph.normalized(TARGET_EXTENT));
            let _ = proxy.send_event(ViewerEvent::ModelLoaded { generation, result });
        };
        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.spawn(task);
        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(task);
    }

    /// Spawn a texture decode tagged with a fresh epoch.
    fn dispatch_texture_decode(&mut self, source: TextureSource) {
        let Some(state) = &mut self.state else { return };
        let epoch = state.texture_epochs.begin();
        state.texture = Some(source.clone());

        let proxy = self.proxy.clone();
        let task = async move {
            let result = resources::decode_texture(&source).await;
            let _ = proxy.send_event(ViewerEvent::TextureDecoded { epoch, result });
        };
        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.spawn(task);
        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(task);
    }

    /// Rebuild the shared material from the current preset and decoded
    /// texture, and push it through the whole scene graph.
    fn recompose_material(&mut self) {
        let Some(state) = &mut self.state else { return };
        let Some(scene) = &mut state.scene else { return };
        compositor::recompose(&state.ctx, scene, state.material, state.decoded.clone());
    }

    fn on_model_loaded(&mut self, generation: u64, result: Result<NodeData>) {
        let Some(state) = &mut self.state else { return };
        if !state.loads.is_current(generation) {
            log::debug!("discarding stale model load (generation {})", generation);
            return;
        }
        let graph = match result {
            Ok(graph) => graph,
            Err(e) => {
                log::error!(
                    "loading {:?} failed, keeping previous model: {:?}",
                    state.descriptor,
                    e
                );
                return;
            }
        };

        // Extra container so the idle spin rotates the normalized model
        // around the origin without disturbing the normalization transform.
        let mut spin_root = NodeData::container();
        spin_root.children.push(graph);
        let mut root = spin_root.upload(&state.ctx.device);
        root.transform.rotation = spin_rotation(state.spin);

        state.scene = Some(root);
        // Reapply the active material before the next frame can draw.
        self.recompose_material();
    }

    fn on_texture_decoded(&mut self, epoch: u64, result: Result<image::DynamicImage>) {
        let Some(state) = &mut self.state else { return };
        if !state.texture_epochs.is_current(epoch) {
            log::debug!("discarding stale texture decode (epoch {})", epoch);
            return;
        }
        match result {
            Ok(image) => state.decoded = Some(image),
            Err(e) => {
                log::warn!(
                    "decoding texture {:?} failed, using fallback color: {:?}",
                    state.texture,
                    e
                );
                state.decoded = None;
            }
        }
        self.recompose_material();
    }

    fn apply_environment(&mut self, next: EnvironmentState) {
        let Some(state) = &mut self.state else { return };
        let delta = state.ctx.environment.state.diff(&next);
        if delta.is_empty() {
            log::debug!("environment unchanged, nothing to apply");
            return;
        }
        log::debug!("applying environment delta {:?}", delta);
        state.ctx.environment.apply(&state.ctx.queue, next);
    }

    fn on_input(&mut self, event_loop: &ActiveEventLoop, input: ViewerInput) {
        match input {
            ViewerInput::SetModel(descriptor) => self.dispatch_load(descriptor),
            ViewerInput::SetMaterial(spec) => {
                if let Some(state) = &mut self.state {
                    state.material = spec;
                }
                self.recompose_material();
            }
            ViewerInput::SetTexture(source) => match source {
                Some(source) => self.dispatch_texture_decode(source),
                None => {
                    if let Some(state) = &mut self.state {
                        // Invalidate in-flight decodes as well
                        state.texture_epochs.begin();
                        state.texture = None;
                        state.decoded = None;
                    }
                    self.recompose_material();
                }
            },
            ViewerInput::SetLightIntensity(intensity) => {
                if let Some(state) = &self.state {
                    let mut next = state.ctx.environment.state;
                    next.light_intensity = intensity.max(0.0);
                    self.apply_environment(next);
                }
            }
            ViewerInput::SetBackground(rgb) => {
                if let Some(state) = &self.state {
                    let mut next = state.ctx.environment.state;
                    next.background = rgb;
                    self.apply_environment(next);
                }
            }
            ViewerInput::SetFog(fog) => {
                if let Some(state) = &self.state {
                    let mut next = state.ctx.environment.state;
                    next.fog = fog;
                    self.apply_environment(next);
                }
            }
            ViewerInput::SetGrid(visible) => {
                if let Some(state) = &self.state {
                    let mut next = state.ctx.environment.state;
                    next.show_grid = visible;
                    self.apply_environment(next);
                }
            }
            ViewerInput::SetEnvironment(next) => self.apply_environment(next),
            ViewerInput::Snapshot => self.capture_snapshot(),
            ViewerInput::Export => {
                let scene = self.state.as_ref().and_then(|s| s.scene.as_ref());
                match &mut self.config.exporter {
                    Some(exporter) => exporter(scene),
                    None => log::info!("export requested but no exporter is attached"),
                }
            }
            ViewerInput::Exit => self.dispose(event_loop),
        }
    }

    fn capture_snapshot(&mut self) {
        let Some(state) = &self.state else { return };
        if !state.is_surface_configured {
            log::warn!("snapshot requested before the surface was configured");
            return;
        }
        let pending = snapshot::begin_capture(&state.ctx, state.scene.as_ref());

        #[cfg(not(target_arch = "wasm32"))]
        {
            let result = self
                .async_runtime
                .block_on(pending.finish())
                .and_then(|png| snapshot::deliver_png(&png).map(|_| ()));
            if let Err(e) = result {
                log::error!("snapshot failed: {:?}", e);
            }
        }

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(async move {
            let result = pending
                .finish()
                .await
                .and_then(|png| snapshot::deliver_png(&png));
            if let Err(e) = result {
                log::error!("snapshot failed: {:?}", e);
            }
        });
    }

    fn dispose(&mut self, event_loop: &ActiveEventLoop) {
        if self.phase == Phase::Disposed {
            return;
        }
        log::info!("disposing viewer");
        self.phase = Phase::Disposed;
        if let Some(state) = &mut self.state {
            state.loads.dispose();
            state.texture_epochs.dispose();
        }
        // Dropping the state releases every GPU resource
        self.state = None;
        event_loop.exit();
    }

    fn resize(&mut self, width: u32, height: u32) {
        let Some(state) = &mut self.state else { return };
        if width == 0 || height == 0 {
            return;
        }
        if state.is_surface_configured
            && state.ctx.config.width == width
            && state.ctx.config.height == height
        {
            return;
        }
        state.ctx.resize(width, height);
        state.is_surface_configured = true;
    }

    fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let Some(state) = &mut self.state else {
            return Ok(());
        };

        // Continuous loop: request the next frame before drawing this one
        state.ctx.window.request_redraw();
        if !state.is_surface_configured {
            return Ok(());
        }

        state.spin += IDLE_SPIN;
        if let Some(scene) = &mut state.scene {
            scene.transform.rotation = spin_rotation(state.spin);
            scene.update_world_transforms(&Instance::default());
            scene.write_to_buffers(&state.ctx.queue);
        }

        let output = state.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            state
                .ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });
        render::render_scene(
            &state.ctx,
            state.scene.as_ref(),
            &mut encoder,
            &view,
            &state.ctx.depth_texture.view,
        );
        state.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn spin_rotation(angle: f32) -> Quaternion<f32> {
    Quaternion::from_angle_y(Rad(angle)) * Quaternion::from_angle_x(Rad(angle))
}

impl ApplicationHandler<ViewerEvent> for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.phase != Phase::Uninitialized {
            return;
        }
        self.phase = Phase::Initializing;

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(&self.config.title);

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("window creation failed: {}", e);
                event_loop.exit();
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(Context::new(window)) {
                Ok(ctx) => self.finish_mount(ctx),
                Err(e) => {
                    log::error!("viewer mount failed: {:?}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match Context::new(window).await {
                    Ok(ctx) => assert!(proxy.send_event(ViewerEvent::Mounted(ctx)).is_ok()),
                    Err(e) => log::error!("viewer mount failed: {:?}", e),
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        if self.phase == Phase::Disposed {
            log::debug!("discarding event after dispose");
            return;
        }
        match event {
            ViewerEvent::Mounted(ctx) => {
                // The message from the wasm `spawn_local` mount
                self.finish_mount(ctx);
                let size = self.state.as_ref().map(|s| s.ctx.window.inner_size());
                if let Some(size) = size {
                    self.resize(size.width, size.height);
                }
            }
            ViewerEvent::Input(input) => self.on_input(event_loop, input),
            ViewerEvent::ModelLoaded { generation, result } => {
                self.on_model_loaded(generation, result)
            }
            ViewerEvent::TextureDecoded { epoch, result } => {
                self.on_texture_decoded(epoch, result)
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.dispose(event_loop),
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                log::trace!("frame dt {:?}", dt);

                match self.render_frame() {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        if let Some(state) = &mut self.state {
                            let size = state.ctx.window.inner_size();
                            state.is_surface_configured = false;
                            self.resize(size.width, size.height);
                        }
                    }
                    Err(e) => log::error!("unable to render: {}", e),
                }
            }
            _ => {}
        }
    }
}

/// Build the event loop and run the viewer until it is disposed.
pub fn run(mut config: ViewerConfig) -> Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    #[cfg(all(feature = "integration-tests", target_os = "linux"))]
    let event_loop: EventLoop<ViewerEvent> = {
        use winit::platform::wayland::EventLoopBuilderExtWayland;

        EventLoop::with_user_event()
            .with_any_thread(true)
            .build()
            .expect("Failed to create an event loop")
    };

    #[cfg(all(feature = "integration-tests", target_os = "windows"))]
    let event_loop: EventLoop<ViewerEvent> = {
        use winit::platform::windows::EventLoopBuilderExtWindows;

        EventLoop::with_user_event()
            .with_any_thread(true)
            .build()
            .expect("Failed to create an event loop")
    };

    #[cfg(not(feature = "integration-tests"))]
    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;

    if let Some(on_handle) = config.on_handle.take() {
        on_handle(ViewerHandle {
            proxy: event_loop.create_proxy(),
        });
    }

    let mut viewer = Viewer::new(&event_loop, config)?;
    event_loop.run_app(&mut viewer)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_generation_supersedes_older_ones() {
        let mut tracker = LoadTracker::new();
        let first = tracker.begin();
        let second = tracker.begin();
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
    }

    #[test]
    fn dispose_invalidates_everything() {
        let mut tracker = LoadTracker::new();
        let generation = tracker.begin();
        tracker.dispose();
        assert!(!tracker.is_current(generation));
        let after = tracker.begin();
        assert!(!tracker.is_current(after));
    }
}
