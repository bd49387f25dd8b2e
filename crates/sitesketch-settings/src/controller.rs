//! Settings Controller
//!
//! Owns the live configuration and the resolved planning boundary, and
//! notifies listeners when the boundary is replaced.

use crate::boundary::load_boundary;
use crate::config::{BoundarySettings, Config};
use crate::error::SettingsResult;
use crate::persistence::SettingsPersistence;
use sitesketch_core::{
    shared, AppEvent, BoundaryPolygon, EventBus, LocalCallback, SettingsEvent, Shared, SharedVec,
};
use std::sync::Arc;

/// Boundary handed to listeners; `None` means clipping is disabled
pub type BoundaryRef = Option<Arc<BoundaryPolygon>>;

/// Controller for settings logic
pub struct SettingsController {
    persistence: Shared<SettingsPersistence>,
    boundary: Shared<BoundaryRef>,
    listeners: SharedVec<LocalCallback<BoundaryRef>>,
    bus: Option<Arc<EventBus>>,
}

impl SettingsController {
    /// Create a controller, resolving the configured boundary immediately
    pub fn new(persistence: SettingsPersistence) -> SettingsResult<Self> {
        let boundary = {
            let config = persistence.config();
            load_boundary(&config.boundary, persistence.base_dir())?
        };
        Ok(Self {
            persistence: shared(persistence),
            boundary: shared(boundary.map(Arc::new)),
            listeners: shared(Vec::new()),
            bus: None,
        })
    }

    /// Publish settings events to `bus`
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        let path = self.persistence.borrow().path().map(|p| p.to_path_buf());
        bus.notify(AppEvent::Settings(SettingsEvent::Loaded { path }));
        self.bus = Some(bus);
        self
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> Config {
        self.persistence.borrow().config().clone()
    }

    /// The boundary currently in effect
    pub fn boundary(&self) -> BoundaryRef {
        self.boundary.borrow().clone()
    }

    /// Register a callback to be notified when the boundary changes
    pub fn on_boundary_changed<F>(&self, callback: F)
    where
        F: Fn(&BoundaryRef) + 'static,
    {
        self.listeners.borrow_mut().push(std::rc::Rc::new(callback));
    }

    /// Re-read the boundary source and notify listeners.
    ///
    /// On error the previous boundary stays in effect.
    pub fn reload_boundary(&self) -> SettingsResult<()> {
        let loaded = {
            let persistence = self.persistence.borrow();
            load_boundary(&persistence.config().boundary, persistence.base_dir())?
        };
        self.replace_boundary(loaded.map(Arc::new));
        Ok(())
    }

    /// Switch to a new boundary source.
    ///
    /// The new source is resolved before anything is changed, so a failing
    /// source leaves both config and boundary untouched.
    pub fn set_boundary_settings(&self, settings: BoundarySettings) -> SettingsResult<()> {
        let loaded = {
            let persistence = self.persistence.borrow();
            let mut candidate = persistence.config().clone();
            candidate.boundary = settings.clone();
            candidate.validate()?;
            load_boundary(&settings, persistence.base_dir())?
        };
        self.persistence.borrow_mut().config_mut().boundary = settings;
        self.replace_boundary(loaded.map(Arc::new));
        Ok(())
    }

    /// Persist the current configuration
    pub fn save(&self) -> SettingsResult<()> {
        self.persistence.borrow().save()
    }

    fn replace_boundary(&self, boundary: BoundaryRef) {
        *self.boundary.borrow_mut() = boundary.clone();

        let rings = boundary.as_ref().map_or(0, |b| b.rings().len());
        tracing::info!("Boundary changed ({} ring(s))", rings);
        if let Some(bus) = &self.bus {
            bus.notify(AppEvent::Settings(SettingsEvent::BoundaryChanged { rings }));
        }

        let listeners: Vec<LocalCallback<BoundaryRef>> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(&boundary);
        }
    }
}
