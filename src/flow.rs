//! Flow control and application event loop.
//!
//! This module provides the main event loop and flow abstraction for the
//! renderer. A "flow" is a scene that handles user input, advances its
//! simulation, and records its render passes each frame. The engine manages
//! multiple active flows and coordinates event distribution and presentation.
//!
//! # User-facing types
//!
//! - [`GraphicsFlow<S, E>`] is the trait for scenes/states that handle events and rendering
//! - [`Out<S, E>`] is the output type for async event handling and context configuration
//!
//! # Lifecycle Flow
//!
//! The event loop follows this pattern each frame:
//! 1. Collect window/device events
//! 2. Call `on_<device/window/custom>_event` on all flows for event distribution
//! 3. Update flow state (via `on_update` / `on_tick`)
//! 4. Acquire the surface texture and let each flow record its passes via `on_render`
//! 5. Submit and present

use std::{fmt::Debug, iter, pin::Pin, sync::Arc};

use instant::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    context::{Context, InitContext, MouseButtonState},
    data_structures::texture::Texture,
};

///
/// This is the Output Type for every lifecycle hook where the user can pass async events that are
/// handled according to the platform you're running on.
///
/// `Out::FutEvent` can be used to resolve a future of an Event that is put in the Event Queue after
/// being resolved. The caller is responsible for handling the event later on and it will have no
/// side effects unless handled.
///
/// `Out::FutFn` can be used to directly modify the state and the mutation is handled internally with
/// no further action required by the callee.
///
/// `Out::Configure` can be used to modify the Context during runtime for instance to change the tick
/// speed or the clear colour.
///
/// `Empty` is the default output used when no eventing/futures need to be handled.
///
pub enum Out<S, E> {
    FutEvent(Vec<Box<dyn Future<Output = E>>>),
    FutFn(Vec<Box<dyn Future<Output = Box<dyn FnOnce(&mut S)>>>>),
    Configure(Box<dyn FnOnce(&mut Context)>),
    Empty,
}

impl<S, E> Default for Out<S, E> {
    fn default() -> Self {
        Self::Empty
    }
}

/// Trait for implementing a renderable scene.
///
/// A `GraphicsFlow` manages a self-contained portion of the application:
/// rendering, input handling, animations, and state updates. The engine
/// coordinates multiple flows, passes events to them, and composes their renders.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once when the flow is created; configure context (camera, clear colour, etc.)
/// 2. `on_window_events()` and `on_device_events()` are called for each winit input event
/// 3. `on_update()` is called every frame
/// 4. `on_tick()` is called every `tick_duration_millis`
/// 5. `on_custom_events()` is called for custom application events
/// 6. `on_resize()` is called after the surface and depth buffer were reconfigured
/// 7. `on_render()` is called each frame to record this flow's render passes
///
pub trait GraphicsFlow<S, E> {
    /// Initialize the flow and configure the context.
    ///
    /// This is the only place to modify the Context and configure things such as the default
    /// background colour or camera start position.
    fn on_init(&mut self, _ctx: &mut Context, _state: &mut S) -> Out<S, E> {
        Out::Empty
    }

    /// Update state every frame.
    ///
    /// Called every frame with the elapsed time `dt`. Use for animations,
    /// physics updates, and other per-frame logic.
    fn on_update(&mut self, _ctx: &Context, _state: &mut S, _dt: Duration) -> Out<S, E> {
        Out::Empty
    }

    /// Update state periodically.
    ///
    /// Called every `tick_duration_millis` milliseconds (configurable via context).
    /// Use for discrete logic that doesn't need to run every frame.
    fn on_tick(&mut self, _ctx: &Context, _state: &mut S) -> Out<S, E> {
        Out::Empty
    }

    /// Handle raw device events (keyboard, mouse hardware input).
    fn on_device_events(
        &mut self,
        _ctx: &Context,
        _state: &mut S,
        _event: &DeviceEvent,
    ) -> Out<S, E> {
        Out::Empty
    }

    /// Handle window events (keyboard, mouse, window resizing, etc.).
    fn on_window_events(
        &mut self,
        _ctx: &Context,
        _state: &mut S,
        _event: &WindowEvent,
    ) -> Out<S, E> {
        Out::Empty
    }

    /// Handle custom application events.
    ///
    /// Returns the event if it was not consumed, allowing it to be passed to
    /// the next flow. Returning `None` means the event was consumed.
    fn on_custom_events(&mut self, _ctx: &Context, _state: &mut S, event: E) -> Option<E> {
        Some(event)
    }

    /// React to a surface reconfiguration.
    ///
    /// Called after the surface, depth buffer and projection were resized.
    /// Flows that own surface-sized render targets recreate them here.
    fn on_resize(&mut self, _ctx: &Context, _state: &mut S, _width: u32, _height: u32) -> Out<S, E> {
        Out::Empty
    }

    /// Record this flow's render passes for the current frame.
    ///
    /// `view` is the surface texture the frame is presented from. A flow that
    /// draws to intermediate targets records those passes first and resolves
    /// into `view` in its final pass.
    fn on_render(
        &mut self,
        ctx: &Context,
        state: &mut S,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    );
}

impl<State, Event> Debug for dyn GraphicsFlow<State, Event> + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// Type alias for a flow constructor (factory function).
///
/// A flow constructor takes an `InitContext` and asynchronously returns a
/// boxed `GraphicsFlow`. This allows lazy initialization and resource loading.
pub type FlowConstructor<S, E> =
    Box<dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = Box<dyn GraphicsFlow<S, E>>>>>>;

/// Application state bundle: GPU context, app state, and surface status.
pub struct AppState<State: 'static> {
    pub(crate) ctx: Context,
    state: State,
    is_surface_configured: bool,
}

impl<State: Default> AppState<State> {
    async fn new(window: Arc<Window>) -> Self {
        let ctx = Context::new(window).await;
        let ctx = match ctx {
            Ok(ctx) => ctx,
            Err(e) => panic!(
                "App initialization failed. Cannot create the main context: {}",
                e
            ),
        };
        Self {
            ctx,
            state: State::default(),
            is_surface_configured: false,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    fn render<Event>(
        &mut self,
        graphics_flows: &mut Vec<Box<dyn GraphicsFlow<State, Event>>>,
    ) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });

        // Each flow records its own passes. The first pass of the first flow
        // is expected to clear `view` with `ctx.clear_colour`.
        graphics_flows.iter_mut().for_each(|flow| {
            flow.on_render(&self.ctx, &mut self.state, &mut encoder, &view);
        });

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App<State: 'static, Event: 'static> {
    async_runtime: tokio::runtime::Runtime,
    proxy: winit::event_loop::EventLoopProxy<FlowEvent<Event>>,
    state: Option<AppState<State>>,
    // This will hold the fully initialized flows once they are ready.
    graphics_flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    // This holds the constructors at the start.
    // We use Option to `take()` it after use.
    constructors: Option<Vec<FlowConstructor<State, Event>>>,
    last_time: Instant,
    time_since_tick: Duration,
}

impl<State, Event> App<State, Event>
where
    State: 'static,
    Event: 'static,
{
    fn new(
        event_loop: &EventLoop<FlowEvent<Event>>,
        constructors: Vec<FlowConstructor<State, Event>>,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            async_runtime,
            proxy,
            state: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
            time_since_tick: Duration::from_millis(0),
        })
    }
}

pub(crate) enum FlowEvent<Event: 'static> {
    Custom(Event),
}

impl<Event> Debug for FlowEvent<Event> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Custom(_) => f.write_str("Custom(E)"),
        }
    }
}

impl<State: 'static + Default, Event: 'static> ApplicationHandler<FlowEvent<Event>>
    for App<State, Event>
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window_attributes = Window::default_attributes();
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => panic!("App initialization failed. Cannot create a window: {}", e),
        };

        let constructors = match self.constructors.take() {
            Some(constructors) => constructors,
            None => return,
        };

        let init_future = async move {
            let app_state = AppState::new(window).await;

            let flow_futures: Vec<_> = constructors
                .into_iter()
                // The clone in into() leverages the internal Arcs of Device and Queue and thus only clones the ref
                .map(|constructor| constructor((&app_state.ctx).into()))
                .collect();
            let flows: Vec<_> = futures::future::join_all(flow_futures).await;
            (app_state, flows)
        };

        let (mut app_state, flows) = self.async_runtime.block_on(init_future);
        self.graphics_flows = flows;
        self.graphics_flows.iter_mut().for_each(|flow| {
            let events = flow.on_init(&mut app_state.ctx, &mut app_state.state);
            let proxy = self.proxy.clone();
            handle_flow_output(
                &self.async_runtime,
                &mut app_state.state,
                &mut app_state.ctx,
                proxy,
                events,
            );
        });
        self.state = Some(app_state);
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: FlowEvent<Event>) {
        match event {
            FlowEvent::Custom(custom_event) => {
                if let Some(state) = &mut self.state {
                    let result = self
                        .graphics_flows
                        .iter_mut()
                        .fold(Some(custom_event), |event, flow| {
                            flow.on_custom_events(&state.ctx, &mut state.state, event?)
                        });
                    if result.is_some() {
                        log::warn!("Warning! Custom event was not consumed this cycle");
                    }
                }
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            let speed_factor = 5.0;
            if let MouseButtonState::Right = state.ctx.mouse.pressed {
                state
                    .ctx
                    .camera
                    .controller
                    .handle_mouse(dx * speed_factor, dy * speed_factor);
            }
        }
        self.graphics_flows.iter_mut().for_each(|f| {
            let events = f.on_device_events(&state.ctx, &mut state.state, &event);
            let proxy = self.proxy.clone();
            handle_flow_output(
                &self.async_runtime,
                &mut state.state,
                &mut state.ctx,
                proxy,
                events,
            );
        });
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        // general stuff
        state.ctx.camera.controller.handle_window_events(&event);

        if let WindowEvent::CursorMoved {
            device_id: _,
            position,
        } = event
        {
            state.ctx.mouse.coords = position;
        };

        self.graphics_flows.iter_mut().for_each(|f| {
            let events = f.on_window_events(&state.ctx, &mut state.state, &event);
            let proxy = self.proxy.clone();
            handle_flow_output(
                &self.async_runtime,
                &mut state.state,
                &mut state.ctx,
                proxy,
                events,
            );
        });

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                state.resize(size.width, size.height);
                self.graphics_flows.iter_mut().for_each(|f| {
                    let events =
                        f.on_resize(&state.ctx, &mut state.state, size.width, size.height);
                    let proxy = self.proxy.clone();
                    handle_flow_output(
                        &self.async_runtime,
                        &mut state.state,
                        &mut state.ctx,
                        proxy,
                        events,
                    );
                });
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                self.time_since_tick += dt;

                match state.render(&mut self.graphics_flows) {
                    Ok(_) => {
                        if self.time_since_tick
                            >= Duration::from_millis(state.ctx.tick_duration_millis)
                        {
                            self.graphics_flows.iter_mut().for_each(|f| {
                                let events = f.on_tick(&state.ctx, &mut state.state);
                                let proxy = self.proxy.clone();
                                handle_flow_output(
                                    &self.async_runtime,
                                    &mut state.state,
                                    &mut state.ctx,
                                    proxy,
                                    events,
                                );
                            });
                            self.time_since_tick = Duration::from_millis(0);
                        }
                        // Update the camera
                        state
                            .ctx
                            .camera
                            .controller
                            .update(&mut state.ctx.camera.camera, dt);
                        state
                            .ctx
                            .camera
                            .uniform
                            .update_view_proj(&state.ctx.camera.camera, &state.ctx.projection);
                        state.ctx.queue.write_buffer(
                            &state.ctx.camera.buffer,
                            0,
                            bytemuck::cast_slice(&[state.ctx.camera.uniform]),
                        );
                        // Update custom stuff
                        self.graphics_flows.iter_mut().for_each(|f| {
                            let events = f.on_update(&state.ctx, &mut state.state, dt);
                            let proxy = self.proxy.clone();
                            handle_flow_output(
                                &self.async_runtime,
                                &mut state.state,
                                &mut state.ctx,
                                proxy,
                                events,
                            );
                        });
                    }
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                        self.graphics_flows.iter_mut().for_each(|f| {
                            let events =
                                f.on_resize(&state.ctx, &mut state.state, size.width, size.height);
                            let proxy = self.proxy.clone();
                            handle_flow_output(
                                &self.async_runtime,
                                &mut state.state,
                                &mut state.ctx,
                                proxy,
                                events,
                            );
                        });
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => match (button, button_state.is_pressed()) {
                (MouseButton::Left, true) => {
                    state.ctx.mouse.pressed = MouseButtonState::Left;
                }
                (MouseButton::Right, true) => {
                    state.ctx.mouse.pressed = MouseButtonState::Right;
                }
                (_, false) => state.ctx.mouse.pressed = MouseButtonState::None,
                _ => (),
            },
            _ => {}
        }
    }
}

fn handle_flow_output<State, Event>(
    async_runtime: &tokio::runtime::Runtime,
    state: &mut State,
    ctx: &mut Context,
    proxy: winit::event_loop::EventLoopProxy<FlowEvent<Event>>,
    out: Out<State, Event>,
) {
    match out {
        // Send the events passed by the user to winit
        Out::FutEvent(futures) => {
            let fut =
                async move { futures::future::join_all(futures.into_iter().map(Pin::from)).await };
            let resolved = async_runtime.block_on(fut);
            resolved.into_iter().for_each(|event| {
                let err = proxy.send_event(FlowEvent::Custom(event));
                if let Err(err) = err {
                    log::error!("{}", err);
                    panic!("Event loop was closed before all events could be processed.")
                }
            });
        }
        // Resolve the futures and apply the mutations to the state
        Out::FutFn(futures) => {
            let events: Vec<Pin<Box<dyn Future<Output = Box<dyn FnOnce(&mut State)>>>>> =
                futures.into_iter().map(Pin::from).collect();
            let fut = async move { futures::future::join_all(events.into_iter()).await };
            let resolved: Vec<Box<dyn FnOnce(&mut State)>> = async_runtime.block_on(fut);
            resolved.into_iter().for_each(|mutation| {
                mutation(state);
            });
        }
        Out::Configure(f) => f(ctx),
        Out::Empty => (),
    }
}

pub fn run<State: 'static + Default, Event: 'static>(
    constructors: Vec<FlowConstructor<State, Event>>,
) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop: EventLoop<FlowEvent<Event>> = EventLoop::with_user_event().build()?;

    let mut app: App<State, Event> = App::new(&event_loop, constructors)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
