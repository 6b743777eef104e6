use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use log::{debug, info};

use crate::config::{Settings, StatusConfig};
use crate::providers::{BuildSource, BuildState, BuildStatus};
use crate::repo::{RepoInfo, RepoResolver, SourceControl};

use super::animator::{AnimationConfig, StatusAnimator};
use super::view::{StatusSink, TriggerEvent, View, ViewId, STATUS_BAR_KEY};

pub const MISSING_TOKEN_MESSAGE: &str = "Missing Travis CI API Token";

/// Per-view state that lives exactly as long as the view.
struct TargetState {
    animator: StatusAnimator,
    /// Last terminal status rendered for this view
    last_status: Option<String>,
}

/// Drives the status bar of every view from trigger events.
///
/// Triggers must be delivered one at a time (`&mut self`); the only
/// concurrent writer is each view's animator timer, and only
/// `on_complete`/`on_error` take a view out of the animating state.
pub struct StatusController<S, B> {
    resolver: RepoResolver<S>,
    builds: B,
    global: Settings,
    animation: AnimationConfig,
    targets: HashMap<ViewId, TargetState>,
}

impl<S: SourceControl, B: BuildSource> StatusController<S, B> {
    pub fn new(resolver: RepoResolver<S>, builds: B, global: Settings) -> Self {
        Self {
            resolver,
            builds,
            global,
            animation: AnimationConfig::default(),
            targets: HashMap::new(),
        }
    }

    pub fn with_animation(mut self, animation: AnimationConfig) -> Self {
        self.animation = animation;
        self
    }

    /// Handle one host trigger for `view`.
    pub async fn handle(&mut self, event: TriggerEvent, view: &View) {
        if view.is_internal() {
            return;
        }

        if event == TriggerEvent::Closed {
            self.close(view.id);
            return;
        }

        debug!("{event:?} on view {:?}", view.id);
        let config = Settings::resolve(&view.settings, &self.global);
        self.refresh(view, &config).await;
    }

    /// Tear down a view: cancel its animator and drop its cached status.
    pub fn close(&mut self, id: ViewId) {
        if let Some(mut target) = self.targets.remove(&id) {
            target.animator.on_complete();
            debug!("Released status state for view {id:?}");
        }
    }

    pub fn is_animating(&self, id: ViewId) -> bool {
        self.targets
            .get(&id)
            .is_some_and(|target| target.animator.is_running())
    }

    /// Label the animator is showing for `id`, if it is animating.
    pub fn building_label(&self, id: ViewId) -> Option<String> {
        self.targets
            .get(&id)
            .filter(|target| target.animator.is_running())
            .and_then(|target| target.animator.label())
    }

    async fn refresh(&mut self, view: &View, config: &StatusConfig) {
        let sink = Arc::clone(&view.sink);

        let Some(token) = config.api_token.as_ref() else {
            self.stop_animation(view, &MISSING_TOKEN_MESSAGE);
            sink.set_status(STATUS_BAR_KEY, MISSING_TOKEN_MESSAGE);
            return;
        };

        let repo = self
            .resolver
            .resolve(view.file_name.as_deref(), config.project_repo.as_deref());

        if let Some(error) = &repo.error {
            self.stop_animation(view, &"repository not resolved");
            if error.is_empty() {
                sink.erase_status(STATUS_BAR_KEY);
            } else {
                sink.set_status(STATUS_BAR_KEY, error);
            }
            return;
        }

        let status = self
            .builds
            .latest_build(config.base_url(), token, &repo)
            .await;

        let animation = &self.animation;
        let target = self.targets.entry(view.id).or_insert_with(|| TargetState {
            animator: StatusAnimator::new(animation.clone(), Arc::clone(&sink)),
            last_status: None,
        });

        if let (Some(branch), Some(number)) = (&repo.branch, &status.build_number) {
            target.animator.set_label(format!("{branch} #{number} building"));
        }

        match render(target, &repo, &status) {
            Some(text) => {
                info!("Build status for view {:?}: {text}", view.id);
                sink.set_status(STATUS_BAR_KEY, &text);
                target.last_status = Some(text);
            }
            None if target.animator.is_running() => {}
            None => match &target.last_status {
                Some(previous) => sink.set_status(STATUS_BAR_KEY, previous),
                None => sink.erase_status(STATUS_BAR_KEY),
            },
        }
    }

    fn stop_animation(&mut self, view: &View, reason: &dyn Display) {
        if let Some(target) = self.targets.get_mut(&view.id) {
            target.animator.on_error(reason);
        }
    }
}

/// Decide what this cycle shows.
///
/// A running build hands the display to the animator and yields `None`.
/// A terminal state ends any animation and yields the formatted text.
fn render(target: &mut TargetState, repo: &RepoInfo, status: &BuildStatus) -> Option<String> {
    let (Some(state), Some(branch)) = (&status.state, &repo.branch) else {
        return None;
    };

    if !state.is_terminal() {
        target.animator.start();
        return None;
    }

    target.animator.on_complete();
    Some(format_status(
        branch,
        status.build_number.as_deref().unwrap_or_default(),
        state,
    ))
}

/// `"<branch> #<number> <symbol>"`
pub fn format_status(branch: &str, build_number: &str, state: &BuildState) -> String {
    format!("{branch} #{build_number} {state}")
}
