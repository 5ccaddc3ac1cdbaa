//! Local change observer (renderer side).
//!
//! Bridges store mutations to the renderer. Each notification is fed to the
//! [`DisplayState`] machine from `sync-core`; the resulting actions re-read
//! only what one visual property needs, or everything on a full resync.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use facesync_core::face::{color, Horizontal, Vertical};
use facesync_core::{
    keys, BackgroundMode, DisplayEvent, DisplayState, Font, RenderAction, TextCase, TextPosition,
    TextStyle, VisualProperty,
};

use crate::store::{ConfigStore, StoreError, SubscriptionId};

/// Resolved background.
#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    /// Solid ARGB color.
    Color(i32),
    /// Image file on disk.
    Image(PathBuf),
}

/// Typeface selection after font capabilities are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Typeface {
    /// Font to load.
    pub font: Font,
    /// Style the font actually provides.
    pub style: TextStyle,
}

impl Typeface {
    /// Pick `font` in `requested` style, degrading when the font lacks it.
    pub fn resolve(font_code: &str, requested: TextStyle) -> Self {
        let font = *Font::find(font_code);
        let style = if font.supports(requested) {
            requested
        } else if requested.is_bold() && font.supports(TextStyle::Bold) {
            TextStyle::Bold
        } else if requested.is_italic() && font.supports(TextStyle::Italic) {
            TextStyle::Italic
        } else {
            TextStyle::Normal
        };
        Self { font, style }
    }
}

/// New value for one visual property.
#[derive(Debug, Clone, PartialEq)]
pub enum VisualUpdate {
    /// Background color or image.
    Background(Background),
    /// Text fill color.
    TextColor(i32),
    /// Typeface.
    Typeface(Typeface),
    /// Whether the text has a shadow.
    TextShadow(bool),
    /// Text size.
    TextSize(f32),
    /// Text alignment.
    TextPosition(Vertical, Horizontal),
    /// Capitalization.
    TextCase(TextCase),
}

/// Every visual property, as read from a store.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceSettings {
    /// Background.
    pub background: Background,
    /// Text fill color.
    pub text_color: i32,
    /// Typeface.
    pub typeface: Typeface,
    /// Text shadow.
    pub text_shadow: bool,
    /// Text size.
    pub text_size: f32,
    /// Text position.
    pub text_position: TextPosition,
    /// Capitalization.
    pub text_case: TextCase,
}

impl FaceSettings {
    /// Read every setting from `store`.
    pub fn load(store: &dyn ConfigStore, image: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            background: read_background(store, image)?,
            text_color: store.get_i32(keys::TEXT_COLOR)?,
            typeface: read_typeface(store)?,
            text_shadow: store.get_bool(keys::TEXT_SHADOW)?,
            text_size: store.get_f32(keys::TEXT_SIZE)?,
            text_position: TextPosition::from_code_or_default(store.get_i32(keys::TEXT_POSITION)?),
            text_case: TextCase::from_code_or_default(store.get_i32(keys::TEXT_CASE)?),
        })
    }

    /// The simplified palette used while dimmed.
    pub fn ambient(&self) -> Self {
        Self {
            background: Background::Color(color::FALLBACK_BACKGROUND),
            text_color: color::WHITE,
            text_shadow: false,
            ..self.clone()
        }
    }
}

fn read_background(store: &dyn ConfigStore, image: &Path) -> Result<Background, StoreError> {
    let mode = store.background_mode()?;
    if mode == BackgroundMode::Image && image.is_file() {
        return Ok(Background::Image(image.to_path_buf()));
    }
    Ok(Background::Color(store.get_i32(keys::BACKGROUND_COLOR)?))
}

fn read_typeface(store: &dyn ConfigStore) -> Result<Typeface, StoreError> {
    let style = TextStyle::from_code_or_default(store.get_i32(keys::TEXT_STYLE)?);
    Ok(Typeface::resolve(&store.get_string(keys::TEXT_FONT)?, style))
}

/// Receives visual updates from the observer.
pub trait RenderHook: Send + Sync {
    /// One property changed.
    fn on_setting_changed(&self, name: &str, update: &VisualUpdate);

    /// Every property must be reapplied.
    fn on_full_resync(&self, face: &FaceSettings);

    /// The display dimmed; switch to the ambient palette.
    fn on_ambient(&self) {}
}

/// Renderer-side store observer.
pub struct LocalChangeObserver<S: ConfigStore, H: RenderHook> {
    store: S,
    hook: H,
    image: PathBuf,
    state: Mutex<DisplayState>,
}

impl<S, H> LocalChangeObserver<S, H>
where
    S: ConfigStore + 'static,
    H: RenderHook + 'static,
{
    /// Create an observer reading `store` and resolving images at `image`.
    pub fn new(store: S, hook: H, image: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            store,
            hook,
            image: image.into(),
            state: Mutex::new(DisplayState::default()),
        })
    }

    /// Subscribe to the store. The subscription does not keep the observer alive.
    pub fn attach(self: &Arc<Self>) -> SubscriptionId {
        let weak: Weak<Self> = Arc::downgrade(self);
        self.store.subscribe(Arc::new(move |name: &str| {
            if let Some(observer) = weak.upgrade() {
                observer.on_setting_changed(name);
            }
        }))
    }

    /// Unsubscribe from the store.
    pub fn detach(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Get a reference to the render hook.
    pub fn hook(&self) -> &H {
        &self.hook
    }

    /// Current display mode.
    pub fn display_state(&self) -> DisplayState {
        *self.lock_state()
    }

    /// Handle a store notification.
    pub fn on_setting_changed(&self, name: &str) {
        self.handle(DisplayEvent::SettingChanged {
            name: name.to_string(),
        });
    }

    /// The device entered its reduced-power display.
    pub fn dim(&self) {
        self.handle(DisplayEvent::Dim);
    }

    /// The device returned to the normal display.
    pub fn wake(&self) {
        self.handle(DisplayEvent::Wake);
    }

    /// Read every setting.
    pub fn load(&self) -> Result<FaceSettings, StoreError> {
        FaceSettings::load(&self.store, &self.image)
    }

    fn lock_state(&self) -> MutexGuard<'_, DisplayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // The state lock is held while the hook runs, so a refresh computed
    // while interactive cannot land after a concurrent dim. Hooks must not
    // call back into the observer.
    fn handle(&self, event: DisplayEvent) {
        let mut state = self.lock_state();
        let (next, actions) = state.on_event(event);
        *state = next;
        for action in actions {
            self.execute(action);
        }
    }

    fn execute(&self, action: RenderAction) {
        match action {
            RenderAction::Refresh { name, property } => match self.read(property) {
                Ok(update) => self.hook.on_setting_changed(&name, &update),
                Err(e) => tracing::warn!("Failed to refresh {}: {}", name, e),
            },
            RenderAction::FullResync => match self.load() {
                Ok(face) => self.hook.on_full_resync(&face),
                Err(e) => tracing::warn!("Full resync failed: {}", e),
            },
            RenderAction::ApplyAmbient => self.hook.on_ambient(),
        }
    }

    fn read(&self, property: VisualProperty) -> Result<VisualUpdate, StoreError> {
        let store = &self.store;
        Ok(match property {
            VisualProperty::Background => {
                VisualUpdate::Background(read_background(store, &self.image)?)
            }
            VisualProperty::TextColor => VisualUpdate::TextColor(store.get_i32(keys::TEXT_COLOR)?),
            VisualProperty::Typeface => VisualUpdate::Typeface(read_typeface(store)?),
            VisualProperty::TextShadow => {
                VisualUpdate::TextShadow(store.get_bool(keys::TEXT_SHADOW)?)
            }
            VisualProperty::TextSize => VisualUpdate::TextSize(store.get_f32(keys::TEXT_SIZE)?),
            VisualProperty::TextPosition => {
                let (v, h) = TextPosition::from_code_or_default(store.get_i32(keys::TEXT_POSITION)?)
                    .alignment();
                VisualUpdate::TextPosition(v, h)
            }
            VisualProperty::TextCase => VisualUpdate::TextCase(TextCase::from_code_or_default(
                store.get_i32(keys::TEXT_CASE)?,
            )),
        })
    }
}

/// Hook that records every call, for tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingHook {
    calls: Arc<Mutex<Vec<HookCall>>>,
}

/// A call received by [`RecordingHook`].
#[derive(Debug, Clone, PartialEq)]
pub enum HookCall {
    /// `on_setting_changed`.
    Changed(String, VisualUpdate),
    /// `on_full_resync`.
    FullResync(FaceSettings),
    /// `on_ambient`.
    Ambient,
}

impl RecordingHook {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<HookCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<HookCall> {
        self.lock().clone()
    }

    /// Number of `on_setting_changed` calls.
    pub fn changed_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|c| matches!(c, HookCall::Changed(..)))
            .count()
    }

    /// Number of `on_full_resync` calls.
    pub fn resync_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|c| matches!(c, HookCall::FullResync(_)))
            .count()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl RenderHook for RecordingHook {
    fn on_setting_changed(&self, name: &str, update: &VisualUpdate) {
        self.lock()
            .push(HookCall::Changed(name.to_string(), update.clone()));
    }

    fn on_full_resync(&self, face: &FaceSettings) {
        self.lock().push(HookCall::FullResync(face.clone()));
    }

    fn on_ambient(&self) {
        self.lock().push(HookCall::Ambient);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use facesync_types::SettingValue;

    fn observer() -> (
        MemoryStore,
        Arc<LocalChangeObserver<MemoryStore, RecordingHook>>,
        RecordingHook,
    ) {
        let store = MemoryStore::new();
        let hook = RecordingHook::new();
        let observer = LocalChangeObserver::new(store.clone(), hook.clone(), "/nonexistent/bg.png");
        observer.attach();
        (store, observer, hook)
    }

    // ===========================================
    // Refresh Tests
    // ===========================================

    #[test]
    fn change_refreshes_only_its_property() {
        let (store, _observer, hook) = observer();

        store.set(keys::TEXT_COLOR, SettingValue::Int32(0x00FF_FFFF)).unwrap();

        assert_eq!(
            hook.calls(),
            vec![HookCall::Changed(
                "text_color".into(),
                VisualUpdate::TextColor(0x00FF_FFFF)
            )]
        );
    }

    #[test]
    fn position_update_carries_alignment() {
        let (store, _observer, hook) = observer();

        store.set(keys::TEXT_POSITION, SettingValue::Int32(6)).unwrap();

        assert_eq!(
            hook.calls(),
            vec![HookCall::Changed(
                "text_position".into(),
                VisualUpdate::TextPosition(Vertical::Bottom, Horizontal::Left)
            )]
        );
    }

    #[test]
    fn image_mode_without_file_shows_color() {
        let (store, observer, _hook) = observer();
        store
            .set(keys::BACKGROUND_TYPE, SettingValue::Int32(BackgroundMode::Image.code()))
            .unwrap();

        let face = observer.load().unwrap();
        assert_eq!(face.background, Background::Color(color::HOLO_BLUE_DARK));
    }

    #[test]
    fn image_mode_with_file_shows_image() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("background_image.png");
        std::fs::write(&image, b"png").unwrap();

        let store = MemoryStore::new();
        store
            .set(keys::BACKGROUND_TYPE, SettingValue::Int32(BackgroundMode::Image.code()))
            .unwrap();
        let observer = LocalChangeObserver::new(store, RecordingHook::new(), &image);

        assert_eq!(observer.load().unwrap().background, Background::Image(image));
    }

    // ===========================================
    // Dimmed Mode Tests
    // ===========================================

    #[test]
    fn dimmed_suppresses_then_resyncs_once() {
        let (store, observer, hook) = observer();

        observer.dim();
        assert_eq!(hook.calls(), vec![HookCall::Ambient]);

        store.set(keys::TEXT_COLOR, SettingValue::Int32(1)).unwrap();
        store.set(keys::TEXT_SIZE, 15.0f32.into()).unwrap();
        assert_eq!(hook.changed_count(), 0);

        observer.wake();
        assert_eq!(hook.changed_count(), 0);
        assert_eq!(hook.resync_count(), 1);

        let Some(HookCall::FullResync(face)) = hook.calls().last().cloned() else {
            panic!("expected a full resync");
        };
        assert_eq!(face.text_color, 1);
        assert_eq!(face.text_size, 15.0);
    }

    #[test]
    fn detach_stops_updates() {
        let store = MemoryStore::new();
        let hook = RecordingHook::new();
        let observer = LocalChangeObserver::new(store.clone(), hook.clone(), "bg.png");
        let id = observer.attach();

        assert!(observer.detach(id));
        store.set(keys::TEXT_CASE, SettingValue::Int32(1)).unwrap();
        assert!(hook.calls().is_empty());
    }

    #[test]
    fn dropped_observer_is_not_called() {
        let store = MemoryStore::new();
        let hook = RecordingHook::new();
        let observer = LocalChangeObserver::new(store.clone(), hook.clone(), "bg.png");
        observer.attach();
        drop(observer);

        store.set(keys::TEXT_CASE, SettingValue::Int32(1)).unwrap();
        assert!(hook.calls().is_empty());
    }

    // ===========================================
    // Typeface Tests
    // ===========================================

    #[test]
    fn typeface_degrades_to_available_style() {
        let dancing = Typeface::resolve("dancing-script", TextStyle::BoldItalic);
        assert_eq!(dancing.style, TextStyle::Bold);

        let pixel = Typeface::resolve("press-start-2p", TextStyle::Italic);
        assert_eq!(pixel.style, TextStyle::Normal);

        let lobster = Typeface::resolve("lobster-two", TextStyle::Italic);
        assert_eq!(lobster.style, TextStyle::Italic);

        let unknown = Typeface::resolve("comic-sans", TextStyle::Bold);
        assert_eq!(unknown.font.code, Font::DEFAULT_CODE);
    }

    #[test]
    fn ambient_palette() {
        let face = FaceSettings::load(&MemoryStore::new(), Path::new("bg.png")).unwrap();
        let ambient = face.ambient();

        assert_eq!(ambient.background, Background::Color(color::FALLBACK_BACKGROUND));
        assert_eq!(ambient.text_color, color::WHITE);
        assert!(!ambient.text_shadow);
        assert_eq!(ambient.text_size, face.text_size);
    }

    // ===========================================
    // Concurrency Tests
    // ===========================================

    /// Signals when a refresh starts and stalls before recording it.
    struct SlowHook {
        started: std::sync::mpsc::Sender<()>,
        calls: RecordingHook,
    }

    impl RenderHook for SlowHook {
        fn on_setting_changed(&self, name: &str, update: &VisualUpdate) {
            let _ = self.started.send(());
            std::thread::sleep(std::time::Duration::from_millis(50));
            self.calls.on_setting_changed(name, update);
        }

        fn on_full_resync(&self, face: &FaceSettings) {
            self.calls.on_full_resync(face);
        }

        fn on_ambient(&self) {
            self.calls.on_ambient();
        }
    }

    #[test]
    fn concurrent_dim_waits_for_running_refresh() {
        let (started, refresh_started) = std::sync::mpsc::channel();
        let calls = RecordingHook::new();
        let observer = LocalChangeObserver::new(
            MemoryStore::new(),
            SlowHook {
                started,
                calls: calls.clone(),
            },
            "missing.png",
        );

        let refreshing = Arc::clone(&observer);
        let refresh = std::thread::spawn(move || refreshing.on_setting_changed(keys::TEXT_SIZE));
        refresh_started.recv().unwrap();
        observer.dim();
        refresh.join().unwrap();

        let calls = calls.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], HookCall::Changed(..)));
        assert_eq!(calls[1], HookCall::Ambient);
        assert!(observer.display_state().is_dimmed());
    }
}
