//! The orchestrator that ties device rules, gesture accumulation, debounce
//! and feedback together.
//!
//! [`ScrollSwitcher`] owns one pipeline per [`Action`] and reacts to
//! [`Command`]s by running samples through it and issuing calls to the
//! [`CollectionProvider`] trait.
//!
//! Everything runs on the caller's thread.  Time is passed in explicitly;
//! the caller is expected to call [`tick`](ScrollSwitcher::tick) at
//! [`next_deadline`](ScrollSwitcher::next_deadline).

use crate::arbiter::{ActionSettings, CollectionSnapshot, SwitchArbiter, SwitchDecision};
use crate::command::{Action, Command, ScrollSample};
use crate::config::Config;
use crate::device::{compile_rules, DeviceProfileResolver};
use crate::feedback::FeedbackCoordinator;
use crate::gesture::{GestureAccumulator, Multipliers};
use crate::timer::Timers;
use crate::traits::{CollectionProvider, FeedbackEvent, FeedbackPayload};
use log::{debug, info, trace, warn};
use std::sync::mpsc;
use std::time::Instant;

/// Possible errors from the switcher.
#[derive(Debug, thiserror::Error)]
pub enum SwitcherError {
    /// The collection provider returned an error.
    #[error("collection provider error: {0}")]
    Provider(String),
}

/// The per-action pipeline.
#[derive(Debug)]
struct ActionSlot {
    bound: bool,
    resolver: DeviceProfileResolver,
    accumulator: GestureAccumulator,
    arbiter: SwitchArbiter,
    settings: ActionSettings,
    multipliers: Multipliers,
}

impl ActionSlot {
    fn new(action: Action, config: &Config) -> Self {
        let section = config.action(action);
        Self {
            bound: false,
            resolver: DeviceProfileResolver::new(compile_rules(
                &action.to_string(),
                &section.devices,
            )),
            accumulator: GestureAccumulator::new(),
            arbiter: SwitchArbiter::new(action),
            settings: section.settings(),
            multipliers: section.multipliers(),
        }
    }
}

fn snapshot_of<P: CollectionProvider>(
    provider: &P,
    action: Action,
) -> Result<CollectionSnapshot, SwitcherError> {
    provider
        .snapshot(action)
        .map_err(|e| SwitcherError::Provider(e.to_string()))
}

/// Read the collection, logging failures as "no switch".
fn read_snapshot<P: CollectionProvider>(
    provider: &P,
    action: Action,
) -> Option<CollectionSnapshot> {
    match snapshot_of(provider, action) {
        Ok(snap) => Some(snap),
        Err(e) => {
            warn!("{}: cannot read collection: {}", action, e);
            None
        }
    }
}

/// Routes scroll samples to window or workspace switches.
///
/// The switcher is generic over any [`CollectionProvider`] implementation,
/// making it independent of Hyprland or any other concrete backend.
///
/// # Typical usage
///
/// ```ignore
/// let mut switcher = ScrollSwitcher::new(HyprlandCollection::new(), Config::default());
/// switcher.handle(command, Instant::now());
/// if let Some(deadline) = switcher.next_deadline() { /* wait, then */ }
/// switcher.tick(Instant::now());
/// ```
pub struct ScrollSwitcher<P: CollectionProvider> {
    provider: P,
    config: Config,
    slots: [ActionSlot; 2],
    timers: Timers<Action>,
    feedback: FeedbackCoordinator,
    fb_tx: Option<mpsc::Sender<FeedbackEvent>>,
}

impl<P: CollectionProvider> ScrollSwitcher<P> {
    /// Create a switcher and bind every action enabled in `config`.
    pub fn new(provider: P, config: Config) -> Self {
        let slots = Action::ALL.map(|action| ActionSlot::new(action, &config));
        let mut switcher = Self {
            provider,
            config,
            slots,
            timers: Timers::new(),
            feedback: FeedbackCoordinator::new(),
            fb_tx: None,
        };
        switcher.enable();
        switcher
    }

    /// Attach a feedback event channel.
    ///
    /// While a feedback session is open the switcher sends a
    /// [`FeedbackEvent::Show`] for every step, and one
    /// [`FeedbackEvent::Hide`] when the session closes or is discarded.
    pub fn set_feedback(&mut self, tx: mpsc::Sender<FeedbackEvent>) {
        self.fb_tx = Some(tx);
    }

    pub fn is_bound(&self, action: Action) -> bool {
        self.slots[action.index()].bound
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Replace the whole configuration.
    ///
    /// Rule lists are recompiled and every resolver cache is dropped.
    /// Settings apply from the next sample on; open sessions and
    /// accumulated scroll survive.  Actions whose `enabled` flag flipped
    /// are bound or unbound.
    pub fn set_config(&mut self, config: Config) {
        for action in Action::ALL {
            let section = config.action(action);
            let slot = &mut self.slots[action.index()];
            debug!(
                "{}: dropping {} cached device resolutions",
                action,
                slot.resolver.cached()
            );
            slot.resolver
                .set_rules(compile_rules(&action.to_string(), &section.devices));
            slot.settings = section.settings();
            slot.multipliers = section.multipliers();
        }
        let previous = std::mem::replace(&mut self.config, config);
        for action in Action::ALL {
            let was = previous.action(action).enabled;
            let now = self.config.action(action).enabled;
            if was && !now {
                self.unbind(action);
            } else if !was && now {
                self.bind(action);
            }
        }
        info!("configuration applied");
    }

    /// Fire timers due at `now`, then apply `config`.
    ///
    /// A deferred switch whose timeout already elapsed is applied under the
    /// configuration it was made with.
    pub fn reload(&mut self, config: Config, now: Instant) {
        self.tick(now);
        self.set_config(config);
    }

    /// Process a single [`Command`] received at `now`.
    ///
    /// Timers due at `now` are fired first so that input never overtakes an
    /// elapsed timeout.
    pub fn handle(&mut self, cmd: Command, now: Instant) {
        self.tick(now);
        match cmd {
            Command::Scroll { action, sample } => {
                self.scroll(action, &sample, now);
            }
            Command::Bind(action) => self.bind(action),
            Command::Unbind(action) => self.unbind(action),
            Command::Rebind(action) => self.rebind(action),
            Command::Enable => self.enable(),
            Command::Disable => self.disable(),
            Command::ReloadConfig => {
                debug!("reload requests are handled by the daemon loop");
            }
        }
    }

    /// Run one sample through the pipeline of `action`.
    pub fn scroll(
        &mut self,
        action: Action,
        sample: &ScrollSample,
        now: Instant,
    ) -> SwitchDecision {
        let slot = &mut self.slots[action.index()];
        if !slot.bound {
            trace!("{}: not bound, sample dropped", action);
            return SwitchDecision::NoSwitch;
        }
        if sample.emulated {
            trace!("{}: pointer-emulated sample dropped", action);
            return SwitchDecision::NoSwitch;
        }
        let rule = match slot.resolver.resolve(&sample.device) {
            Ok(rule) => rule,
            Err(e) => {
                debug!("{}: {}", action, e);
                return SwitchDecision::NoSwitch;
            }
        };
        let distance = slot.accumulator.feed(sample, rule, slot.multipliers);
        trace!("{}: {:?} from {} -> distance {}", action, sample.kind, sample.device, distance);

        let provider = &self.provider;
        let decision = slot.arbiter.on_distance(
            distance,
            &slot.settings,
            || read_snapshot(provider, action),
            now,
            &mut self.timers,
            &mut self.feedback,
        );

        match decision {
            SwitchDecision::Activate(index) => self.activate(action, index),
            SwitchDecision::Preview {
                base,
                selected,
                size,
                ..
            } => self.send_feedback(FeedbackEvent::Show(FeedbackPayload {
                action,
                base_index: base,
                selected_index: selected,
                size,
            })),
            SwitchDecision::Absorbed | SwitchDecision::NoSwitch => {}
        }
        decision
    }

    /// Fire every timer due at `now`.
    ///
    /// An expiring feedback session hides its popup and activates its final
    /// selection.
    pub fn tick(&mut self, now: Instant) {
        for (id, action) in self.timers.expire(now) {
            let had_session = self.feedback.session(action).is_some();
            let provider = &self.provider;
            let target = self.slots[action.index()].arbiter.on_timer(
                id,
                || read_snapshot(provider, action),
                &mut self.feedback,
            );
            if had_session && self.feedback.session(action).is_none() {
                self.send_feedback(FeedbackEvent::Hide(action));
            }
            if let Some(index) = target {
                self.activate(action, index);
            }
        }
    }

    /// Start accepting samples for `action`.
    pub fn bind(&mut self, action: Action) {
        let slot = &mut self.slots[action.index()];
        if !slot.bound {
            slot.bound = true;
            info!("{}: bound", action);
        }
    }

    /// Stop accepting samples for `action` and drop everything in flight.
    pub fn unbind(&mut self, action: Action) {
        self.teardown(action);
        let slot = &mut self.slots[action.index()];
        if slot.bound {
            slot.bound = false;
            info!("{}: unbound", action);
        }
    }

    /// Re-attach `action`: in-flight state is dropped, binding is kept.
    pub fn rebind(&mut self, action: Action) {
        self.teardown(action);
        info!("{}: rebound", action);
    }

    /// Bind every action the configuration enables.
    pub fn enable(&mut self) {
        for action in Action::ALL {
            if self.config.action(action).enabled {
                self.bind(action);
            }
        }
    }

    /// Unbind everything.  Pending timers are cancelled and open sessions
    /// are discarded without activating their selection.
    pub fn disable(&mut self) {
        for action in Action::ALL {
            self.unbind(action);
        }
        info!("disabled");
    }

    fn teardown(&mut self, action: Action) {
        let slot = &mut self.slots[action.index()];
        let teardown = slot.arbiter.reset(&mut self.timers, &mut self.feedback);
        slot.accumulator.reset();
        if teardown.session_discarded {
            self.send_feedback(FeedbackEvent::Hide(action));
        }
        if teardown.timer_cancelled || teardown.session_discarded {
            debug!("{}: in-flight switch cancelled", action);
        }
    }

    fn activate(&self, action: Action, index: usize) {
        if let Err(e) = self
            .provider
            .activate(action, index)
            .map_err(|e| SwitcherError::Provider(e.to_string()))
        {
            warn!("{}: activating index {} failed: {}", action, index, e);
        }
    }

    fn send_feedback(&self, event: FeedbackEvent) {
        if let Some(tx) = &self.fb_tx {
            let _ = tx.send(event);
        }
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{DeviceId, ScrollKind};
    use crate::config::ActionConfig;
    use crate::device::{AxisMode, DeviceRuleConfig};
    use std::cell::RefCell;
    use std::time::Duration;

    /// Record-keeping mock collection.  Activation moves the current item,
    /// like focusing a window or workspace would.
    #[derive(Debug)]
    struct RecorderCollection {
        sizes: RefCell<[usize; 2]>,
        current: RefCell<[usize; 2]>,
        activations: RefCell<Vec<(Action, usize)>>,
        fail_activate: bool,
    }

    impl RecorderCollection {
        fn new(windows: usize, workspaces: usize) -> Self {
            Self {
                sizes: RefCell::new([windows, workspaces]),
                current: RefCell::new([0, 0]),
                activations: RefCell::new(Vec::new()),
                fail_activate: false,
            }
        }

        fn set_current(&self, action: Action, index: usize) {
            self.current.borrow_mut()[action.index()] = index;
        }

        fn set_size(&self, action: Action, size: usize) {
            self.sizes.borrow_mut()[action.index()] = size;
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("recorder error")]
    struct RecorderErr;

    impl CollectionProvider for RecorderCollection {
        type Error = RecorderErr;

        fn snapshot(&self, action: Action) -> Result<CollectionSnapshot, RecorderErr> {
            Ok(CollectionSnapshot::new(
                self.sizes.borrow()[action.index()],
                self.current.borrow()[action.index()],
            ))
        }

        fn activate(&self, action: Action, index: usize) -> Result<(), RecorderErr> {
            if self.fail_activate {
                return Err(RecorderErr);
            }
            self.activations.borrow_mut().push((action, index));
            self.set_current(action, index);
            Ok(())
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn section(visualize: bool, cycle: bool, devices: Vec<DeviceRuleConfig>) -> ActionConfig {
        ActionConfig {
            visualize,
            cycle,
            timeout_ms: 300,
            devices,
            ..ActionConfig::default()
        }
    }

    fn touchpad_rule(resistance: f64) -> DeviceRuleConfig {
        DeviceRuleConfig {
            name_mask: Some("Touchpad".into()),
            resistance,
            ..DeviceRuleConfig::default()
        }
    }

    fn default_rule() -> DeviceRuleConfig {
        DeviceRuleConfig::default()
    }

    fn config(visualize: bool, cycle: bool) -> Config {
        Config {
            windows: section(visualize, cycle, vec![touchpad_rule(80.0), default_rule()]),
            workspaces: section(visualize, cycle, vec![touchpad_rule(80.0), default_rule()]),
        }
    }

    fn mouse() -> DeviceId {
        DeviceId::new("USB Mouse", "046d", "c077")
    }

    fn wheel(kind: ScrollKind) -> ScrollSample {
        ScrollSample::new(mouse(), kind)
    }

    fn pad(dy: f64) -> ScrollSample {
        ScrollSample::smooth(DeviceId::named("ELAN Touchpad"), 0.0, dy)
    }

    fn scroll(action: Action, sample: ScrollSample) -> Command {
        Command::Scroll { action, sample }
    }

    fn make(visualize: bool, cycle: bool) -> (ScrollSwitcher<RecorderCollection>, Instant) {
        (
            ScrollSwitcher::new(RecorderCollection::new(4, 4), config(visualize, cycle)),
            Instant::now(),
        )
    }

    fn activations(s: &ScrollSwitcher<RecorderCollection>) -> Vec<(Action, usize)> {
        s.provider.activations.borrow().clone()
    }

    #[test]
    fn wheel_switches_workspace_immediately() {
        let (mut s, t0) = make(false, true);
        s.handle(scroll(Action::Workspaces, wheel(ScrollKind::Down)), t0);
        assert_eq!(activations(&s), vec![(Action::Workspaces, 1)]);
    }

    #[test]
    fn second_click_inside_timeout_is_absorbed() {
        let (mut s, t0) = make(false, true);
        s.handle(scroll(Action::Workspaces, wheel(ScrollKind::Down)), t0);
        s.handle(scroll(Action::Workspaces, wheel(ScrollKind::Down)), t0 + ms(50));
        assert_eq!(activations(&s), vec![(Action::Workspaces, 1)]);

        s.handle(scroll(Action::Workspaces, wheel(ScrollKind::Down)), t0 + ms(299));
        assert_eq!(activations(&s).len(), 1);

        s.handle(scroll(Action::Workspaces, wheel(ScrollKind::Down)), t0 + ms(300));
        assert_eq!(
            activations(&s),
            vec![(Action::Workspaces, 1), (Action::Workspaces, 2)]
        );
    }

    #[test]
    fn cyclic_up_from_first_wraps_to_last() {
        let (mut s, t0) = make(false, true);
        s.provider.set_size(Action::Workspaces, 3);
        s.handle(scroll(Action::Workspaces, wheel(ScrollKind::Up)), t0);
        assert_eq!(activations(&s), vec![(Action::Workspaces, 2)]);
    }

    #[test]
    fn clamped_up_from_first_does_nothing() {
        let (mut s, t0) = make(false, false);
        s.handle(scroll(Action::Workspaces, wheel(ScrollKind::Up)), t0);
        assert!(activations(&s).is_empty());
    }

    #[test]
    fn touchpad_needs_resistance_worth_of_scroll() {
        let (mut s, t0) = make(false, true);
        let mut at = 0;
        for _ in 0..2 {
            s.handle(scroll(Action::Workspaces, pad(30.0)), t0 + ms(at));
            at += 10;
        }
        assert!(activations(&s).is_empty());
        s.handle(scroll(Action::Workspaces, pad(30.0)), t0 + ms(at));
        assert_eq!(activations(&s), vec![(Action::Workspaces, 1)]);
    }

    #[test]
    fn emulated_samples_are_ignored() {
        let (mut s, t0) = make(false, true);
        let mut sample = wheel(ScrollKind::Down);
        sample.emulated = true;
        assert_eq!(s.scroll(Action::Workspaces, &sample, t0), SwitchDecision::NoSwitch);
        assert!(activations(&s).is_empty());
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn visual_session_activates_once_on_expiry() {
        let (mut s, t0) = make(true, true);
        let (tx, rx) = mpsc::channel();
        s.set_feedback(tx);
        s.provider.set_current(Action::Windows, 1);

        s.handle(scroll(Action::Windows, wheel(ScrollKind::Down)), t0);
        s.handle(scroll(Action::Windows, wheel(ScrollKind::Down)), t0 + ms(100));
        s.handle(scroll(Action::Windows, wheel(ScrollKind::Up)), t0 + ms(200));
        assert!(activations(&s).is_empty());
        assert_eq!(s.next_deadline(), Some(t0 + ms(500)));

        s.tick(t0 + ms(499));
        assert!(activations(&s).is_empty());
        s.tick(t0 + ms(500));
        assert_eq!(activations(&s), vec![(Action::Windows, 2)]);

        let events: Vec<FeedbackEvent> = rx.try_iter().collect();
        let show = |selected| {
            FeedbackEvent::Show(FeedbackPayload {
                action: Action::Windows,
                base_index: 1,
                selected_index: selected,
                size: 4,
            })
        };
        assert_eq!(
            events,
            vec![show(2), show(3), show(2), FeedbackEvent::Hide(Action::Windows)]
        );

        // A late duplicate tick does nothing.
        s.tick(t0 + ms(10_000));
        assert_eq!(activations(&s).len(), 1);
    }

    #[test]
    fn unknown_gesture_keeps_session_alive() {
        let (mut s, t0) = make(true, true);
        s.handle(scroll(Action::Windows, wheel(ScrollKind::Down)), t0);
        s.handle(scroll(Action::Windows, wheel(ScrollKind::Unknown)), t0 + ms(250));
        s.tick(t0 + ms(300));
        assert!(activations(&s).is_empty());
        assert!(s.feedback.session(Action::Windows).is_some());
        s.tick(t0 + ms(550));
        assert_eq!(activations(&s), vec![(Action::Windows, 1)]);
    }

    #[test]
    fn shrinking_collection_reclamps_deferred_switch() {
        let (mut s, t0) = make(true, false);
        s.provider.set_current(Action::Windows, 2);
        s.handle(scroll(Action::Windows, wheel(ScrollKind::Down)), t0);
        // Two windows close while the popup is up.
        s.provider.set_size(Action::Windows, 2);
        s.provider.set_current(Action::Windows, 0);
        s.handle(scroll(Action::Windows, wheel(ScrollKind::Down)), t0 + ms(100));
        s.tick(t0 + ms(400));
        assert_eq!(activations(&s), vec![(Action::Windows, 1)]);
    }

    #[test]
    fn disable_cancels_without_ghost_activation() {
        let (mut s, t0) = make(true, true);
        let (tx, rx) = mpsc::channel();
        s.set_feedback(tx);
        s.handle(scroll(Action::Windows, wheel(ScrollKind::Down)), t0);
        s.handle(Command::Disable, t0 + ms(10));
        assert_eq!(s.next_deadline(), None);
        s.tick(t0 + ms(10_000));
        assert!(activations(&s).is_empty());
        assert!(!s.is_bound(Action::Windows));
        assert_eq!(
            rx.try_iter().last(),
            Some(FeedbackEvent::Hide(Action::Windows))
        );

        s.handle(scroll(Action::Windows, wheel(ScrollKind::Down)), t0 + ms(20));
        assert!(activations(&s).is_empty());

        s.handle(Command::Enable, t0 + ms(30));
        s.handle(scroll(Action::Workspaces, wheel(ScrollKind::Down)), t0 + ms(40));
        s.tick(t0 + ms(400));
        assert_eq!(activations(&s), vec![(Action::Workspaces, 1)]);
    }

    #[test]
    fn rebind_drops_accumulated_scroll() {
        let (mut s, t0) = make(false, true);
        s.handle(scroll(Action::Workspaces, pad(60.0)), t0);
        s.handle(Command::Rebind(Action::Workspaces), t0 + ms(1));
        assert!(s.is_bound(Action::Workspaces));
        s.handle(scroll(Action::Workspaces, pad(60.0)), t0 + ms(2));
        assert!(activations(&s).is_empty());
        s.handle(scroll(Action::Workspaces, pad(20.0)), t0 + ms(3));
        assert_eq!(activations(&s), vec![(Action::Workspaces, 1)]);
    }

    #[test]
    fn unbound_action_ignores_samples() {
        let (mut s, t0) = make(false, true);
        s.handle(Command::Unbind(Action::Windows), t0);
        s.handle(scroll(Action::Windows, wheel(ScrollKind::Down)), t0);
        s.handle(scroll(Action::Workspaces, wheel(ScrollKind::Down)), t0);
        assert_eq!(activations(&s), vec![(Action::Workspaces, 1)]);
        s.handle(Command::Bind(Action::Windows), t0 + ms(1));
        s.handle(scroll(Action::Windows, wheel(ScrollKind::Down)), t0 + ms(1));
        assert_eq!(activations(&s).len(), 2);
    }

    #[test]
    fn actions_debounce_independently() {
        let (mut s, t0) = make(false, true);
        s.handle(scroll(Action::Workspaces, wheel(ScrollKind::Down)), t0);
        s.handle(scroll(Action::Windows, wheel(ScrollKind::Down)), t0 + ms(10));
        assert_eq!(
            activations(&s),
            vec![(Action::Workspaces, 1), (Action::Windows, 1)]
        );
    }

    #[test]
    fn set_config_replaces_rules_and_settings() {
        let (mut s, t0) = make(false, true);
        s.handle(scroll(Action::Workspaces, pad(60.0)), t0);
        let mut cfg = config(false, true);
        cfg.workspaces.devices = vec![touchpad_rule(200.0), default_rule()];
        s.set_config(cfg);
        // Residual (60) survives, the new resistance applies.
        s.handle(scroll(Action::Workspaces, pad(60.0)), t0 + ms(1));
        assert!(activations(&s).is_empty());
        s.handle(scroll(Action::Workspaces, pad(80.0)), t0 + ms(2));
        assert_eq!(activations(&s), vec![(Action::Workspaces, 1)]);
    }

    #[test]
    fn set_config_unbinds_disabled_actions() {
        let (mut s, t0) = make(true, true);
        s.handle(scroll(Action::Windows, wheel(ScrollKind::Down)), t0);
        let mut cfg = config(true, true);
        cfg.windows.enabled = false;
        s.set_config(cfg);
        assert!(!s.is_bound(Action::Windows));
        assert!(s.feedback.session(Action::Windows).is_none());
        s.tick(t0 + ms(1000));
        assert!(activations(&s).is_empty());

        s.set_config(config(true, true));
        assert!(s.is_bound(Action::Windows));
    }

    #[test]
    fn missing_default_rule_means_no_switch() {
        let mut cfg = config(false, true);
        cfg.workspaces.devices = vec![touchpad_rule(1.0)];
        let mut s = ScrollSwitcher::new(RecorderCollection::new(4, 4), cfg);
        let t0 = Instant::now();
        s.handle(scroll(Action::Workspaces, wheel(ScrollKind::Down)), t0);
        assert!(activations(&s).is_empty());
        s.handle(scroll(Action::Workspaces, pad(1.0)), t0 + ms(1));
        assert_eq!(activations(&s), vec![(Action::Workspaces, 1)]);
    }

    #[test]
    fn disabled_axis_on_device_rule() {
        let mut cfg = config(false, true);
        cfg.workspaces.devices = vec![DeviceRuleConfig {
            vertical: AxisMode::Disabled,
            ..DeviceRuleConfig::default()
        }];
        let mut s = ScrollSwitcher::new(RecorderCollection::new(4, 4), cfg);
        let t0 = Instant::now();
        s.handle(scroll(Action::Workspaces, wheel(ScrollKind::Down)), t0);
        assert!(activations(&s).is_empty());
        s.handle(scroll(Action::Workspaces, wheel(ScrollKind::Right)), t0);
        assert_eq!(activations(&s), vec![(Action::Workspaces, 1)]);
    }

    #[test]
    fn empty_collection_is_swallowed() {
        let (mut s, t0) = make(false, true);
        s.provider.set_size(Action::Windows, 0);
        let d = s.scroll(Action::Windows, &wheel(ScrollKind::Down), t0);
        assert_eq!(d, SwitchDecision::NoSwitch);
        assert!(activations(&s).is_empty());
    }

    #[test]
    fn failing_activation_is_logged_not_raised() {
        let mut provider = RecorderCollection::new(3, 3);
        provider.fail_activate = true;
        let mut s = ScrollSwitcher::new(provider, config(false, true));
        let t0 = Instant::now();
        let d = s.scroll(Action::Workspaces, &wheel(ScrollKind::Down), t0);
        assert_eq!(d, SwitchDecision::Activate(1));
        // Still debouncing afterwards.
        assert_eq!(s.next_deadline(), Some(t0 + ms(300)));
    }

    #[test]
    fn handle_fires_due_timers_first() {
        let (mut s, t0) = make(true, true);
        s.handle(scroll(Action::Windows, wheel(ScrollKind::Down)), t0);
        // No explicit tick: the next command arrives after the expiry.
        s.handle(scroll(Action::Windows, wheel(ScrollKind::Down)), t0 + ms(400));
        assert_eq!(activations(&s), vec![(Action::Windows, 1)]);
        let session = s.feedback.session(Action::Windows).unwrap();
        assert_eq!(session.base_index, 1);
        assert_eq!(session.position(), 2);
    }

    #[test]
    fn reload_fires_elapsed_switch_under_old_config() {
        let (mut s, t0) = make(true, true);
        s.handle(scroll(Action::Windows, wheel(ScrollKind::Down)), t0);
        let mut cfg = config(true, true);
        cfg.windows.enabled = false;
        // The preview expired at 300ms; the reload arrives later.
        s.reload(cfg, t0 + ms(400));
        assert_eq!(activations(&s), vec![(Action::Windows, 1)]);
        assert!(!s.is_bound(Action::Windows));
    }

    #[test]
    fn reload_before_expiry_cancels_with_unbind() {
        let (mut s, t0) = make(true, true);
        s.handle(scroll(Action::Windows, wheel(ScrollKind::Down)), t0);
        let mut cfg = config(true, true);
        cfg.windows.enabled = false;
        s.reload(cfg, t0 + ms(100));
        s.tick(t0 + ms(1000));
        assert!(activations(&s).is_empty());
    }

    #[test]
    fn enormous_smooth_burst_switches_once() {
        let (mut s, t0) = make(false, true);
        s.handle(scroll(Action::Workspaces, pad(1e17)), t0);
        // i32::MAX steps from 0 in a cycle of 4.
        assert_eq!(activations(&s), vec![(Action::Workspaces, 3)]);
        s.handle(scroll(Action::Workspaces, pad(-1e300)), t0 + ms(1));
        assert_eq!(activations(&s).len(), 1);
    }
}
