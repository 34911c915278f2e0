use crate::config::Settings;
use crate::error::{FetchError, SubmissionError, SubmissionStep};
use crate::fetch::{FetchOutcome, FetchResult};
use crate::form::{BackupForm, FormFocus};
use crate::input::Action;
use crate::model::{BackupConfig, Resource, ResourceKind};
use crate::workflow::SubmissionState;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    Fetch(Vec<ResourceKind>),
    Submit(BackupConfig),
    OpenPolicyPage(String),
}

pub struct App {
    running: bool,
    mode: InputMode,
    status: String,
    show_help: bool,
    cluster: String,
    context: String,
    form: BackupForm,
    fetches: HashMap<ResourceKind, FetchResult>,
    submission: SubmissionState,
    label_cluster: bool,
    show_license: bool,
    admin_namespace: String,
    policy_url: String,
}

impl App {
    pub fn new(cluster: String, context: String, settings: &Settings) -> Self {
        let fetches = ResourceKind::ALL
            .iter()
            .copied()
            .map(|kind| (kind, FetchResult::default()))
            .collect::<HashMap<_, _>>();

        Self {
            running: true,
            mode: InputMode::Normal,
            status: "Ready".to_string(),
            show_help: false,
            cluster,
            context,
            form: BackupForm::new(settings.defaults),
            fetches,
            submission: SubmissionState::Idle,
            label_cluster: settings.label_cluster,
            show_license: settings.show_license,
            admin_namespace: settings.admin_namespace.clone(),
            policy_url: settings.policy_page_url(),
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn form(&self) -> &BackupForm {
        &self.form
    }

    pub fn submission(&self) -> &SubmissionState {
        &self.submission
    }

    pub fn label_cluster(&self) -> bool {
        self.label_cluster
    }

    pub fn show_license(&self) -> bool {
        self.show_license
    }

    pub fn admin_namespace(&self) -> &str {
        &self.admin_namespace
    }

    pub fn fetch(&self, kind: ResourceKind) -> Option<&FetchResult> {
        self.fetches.get(&kind)
    }

    pub fn selected_cluster(&self) -> Option<&Resource> {
        let name = self.form.values().source_cluster.as_str();
        self.fetches
            .get(&ResourceKind::ManagedClusters)?
            .items
            .iter()
            .find(|item| item.name == name)
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn fetch_kinds(&self) -> Vec<ResourceKind> {
        ResourceKind::ALL
            .iter()
            .copied()
            .filter(|kind| *kind != ResourceKind::Licenses || self.show_license)
            .collect()
    }

    pub fn begin_fetch(&mut self, kinds: &[ResourceKind]) {
        for kind in kinds {
            self.fetches.entry(*kind).or_default().begin();
        }
    }

    pub fn complete_fetch(&mut self, outcome: FetchOutcome) {
        let FetchOutcome { kind, result } = outcome;
        let succeeded = result.is_ok();
        if let Err(FetchError { message, .. }) = &result
            && !self.submission.in_flight()
        {
            self.status = format!("Failed loading {}: {message}", kind.title());
        }
        self.fetches.entry(kind).or_default().complete(result);

        if !succeeded {
            return;
        }
        match kind {
            ResourceKind::Namespaces | ResourceKind::ManagedClusters => {
                let first_namespace = self.first_name(ResourceKind::Namespaces);
                let first_cluster = self.first_name(ResourceKind::ManagedClusters);
                self.form
                    .apply_defaults(first_namespace.as_deref(), first_cluster.as_deref());
            }
            ResourceKind::Licenses => {
                let first_license = self.first_name(ResourceKind::Licenses);
                self.form.set_license(first_license.as_deref());
            }
        }
    }

    pub fn complete_submission(
        &mut self,
        outcome: Result<Vec<SubmissionStep>, SubmissionError>,
    ) -> AppCommand {
        match outcome {
            Ok(completed) => {
                self.submission = SubmissionState::Success { completed };
                if self.label_cluster {
                    self.status = format!("Backup target saved, continue at {}", self.policy_url);
                    AppCommand::OpenPolicyPage(self.policy_url.clone())
                } else {
                    self.status = "Backup target saved".to_string();
                    AppCommand::None
                }
            }
            Err(error) => {
                self.status = format!("Submit failed: {}", error.user_message());
                self.submission = SubmissionState::Failed(error);
                AppCommand::None
            }
        }
    }

    pub fn apply_action(&mut self, action: Action) -> AppCommand {
        debug!("action={action:?}");
        if self.show_help && !matches!(action, Action::ToggleHelp | Action::Quit) {
            self.show_help = false;
            if matches!(action, Action::Dismiss) {
                return AppCommand::None;
            }
        }

        match action {
            Action::Quit => {
                self.running = false;
                self.status = "Exit requested".to_string();
                AppCommand::None
            }
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
                AppCommand::None
            }
            Action::NextField => {
                self.form.move_focus(1);
                AppCommand::None
            }
            Action::PrevField => {
                self.form.move_focus(-1);
                AppCommand::None
            }
            Action::NextOption => {
                self.cycle_focused_option(1);
                AppCommand::None
            }
            Action::PrevOption => {
                self.cycle_focused_option(-1);
                AppCommand::None
            }
            Action::BeginEdit => {
                self.begin_edit();
                AppCommand::None
            }
            Action::Activate => match self.form.focus() {
                FormFocus::Submit => self.start_submission(),
                FormFocus::Field(field) if field.options_source().is_some() => {
                    self.cycle_focused_option(1);
                    AppCommand::None
                }
                FormFocus::Field(_) => {
                    self.begin_edit();
                    AppCommand::None
                }
            },
            Action::Submit => {
                self.finish_edit();
                self.start_submission()
            }
            Action::Refresh => {
                let kinds = self.fetch_kinds();
                self.status = "Refreshing cluster lists".to_string();
                AppCommand::Fetch(kinds)
            }
            Action::Dismiss => {
                if matches!(self.submission, SubmissionState::Failed(_)) {
                    self.submission = SubmissionState::Idle;
                    self.status = "Ready".to_string();
                }
                AppCommand::None
            }
            Action::FinishEdit => {
                self.finish_edit();
                AppCommand::None
            }
            Action::Backspace => {
                self.form.pop_char();
                AppCommand::None
            }
            Action::InputChar(c) => {
                self.form.push_char(c);
                AppCommand::None
            }
        }
    }

    fn start_submission(&mut self) -> AppCommand {
        if self.submission.in_flight() {
            self.status = "Submission already in progress".to_string();
            return AppCommand::None;
        }
        self.submission = SubmissionState::Submitting;
        self.status = "Submitting backup target".to_string();
        AppCommand::Submit(self.form.snapshot())
    }

    fn begin_edit(&mut self) {
        if self.form.begin_edit() {
            self.mode = InputMode::Editing;
        }
    }

    fn finish_edit(&mut self) {
        self.form.end_edit();
        self.mode = InputMode::Normal;
    }

    fn cycle_focused_option(&mut self, delta: isize) {
        let Some(kind) = self
            .form
            .focused_field()
            .and_then(|field| field.options_source())
        else {
            return;
        };
        let options = self
            .fetches
            .get(&kind)
            .map(FetchResult::names)
            .unwrap_or_default();
        self.form.cycle_option(&options, delta);
    }

    fn first_name(&self, kind: ResourceKind) -> Option<String> {
        self.fetches
            .get(&kind)
            .and_then(FetchResult::first_name)
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::{App, AppCommand, InputMode};
    use crate::config::Settings;
    use crate::error::{FetchError, SubmissionError, SubmissionStep};
    use crate::fetch::FetchOutcome;
    use crate::input::Action;
    use crate::model::{Resource, ResourceKind};
    use crate::workflow::SubmissionState;

    fn app() -> App {
        App::new(
            "https://hub:6443/".to_string(),
            "hub".to_string(),
            &Settings::default(),
        )
    }

    fn loaded(kind: ResourceKind, names: &[&str]) -> FetchOutcome {
        FetchOutcome {
            kind,
            result: Ok(names.iter().map(|name| Resource::named(*name)).collect()),
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.apply_action(Action::InputChar(c));
        }
    }

    #[test]
    fn selected_cluster_follows_the_source_field() {
        let mut app = app();
        assert!(app.selected_cluster().is_none());
        app.complete_fetch(loaded(ResourceKind::ManagedClusters, &["spoke-1", "spoke-2"]));
        assert_eq!(app.selected_cluster().map(|c| c.uid.as_str()), Some("uid-spoke-1"));

        app.apply_action(Action::NextOption);
        assert_eq!(app.selected_cluster().map(|c| c.name.as_str()), Some("spoke-2"));
    }

    #[test]
    fn licenses_are_fetched_only_when_shown() {
        let app = app();
        assert_eq!(
            app.fetch_kinds(),
            vec![ResourceKind::Namespaces, ResourceKind::ManagedClusters]
        );

        let settings = Settings {
            show_license: true,
            ..Settings::default()
        };
        let app = App::new(String::new(), String::new(), &settings);
        assert_eq!(app.fetch_kinds().len(), 3);
    }

    #[test]
    fn fetched_lists_seed_select_defaults() {
        let mut app = app();
        app.begin_fetch(&app.fetch_kinds());
        assert!(app.fetch(ResourceKind::Namespaces).unwrap().loading);

        app.complete_fetch(loaded(ResourceKind::Namespaces, &["team-a", "team-b"]));
        app.complete_fetch(loaded(ResourceKind::ManagedClusters, &["spoke-1"]));

        assert_eq!(app.form().values().backup_namespace, "team-a");
        assert_eq!(app.form().values().source_cluster, "spoke-1");
        assert!(!app.fetch(ResourceKind::Namespaces).unwrap().loading);
    }

    #[test]
    fn empty_cluster_list_leaves_source_unset() {
        let mut app = app();
        app.complete_fetch(loaded(ResourceKind::ManagedClusters, &[]));
        assert_eq!(app.form().values().source_cluster, "");
    }

    #[test]
    fn fetch_failure_reports_status_and_keeps_items() {
        let mut app = app();
        app.complete_fetch(loaded(ResourceKind::Namespaces, &["team-a"]));
        app.complete_fetch(FetchOutcome {
            kind: ResourceKind::Namespaces,
            result: Err(FetchError::new(ResourceKind::Namespaces, "forbidden")),
        });

        assert_eq!(app.status(), "Failed loading Namespaces: forbidden");
        assert_eq!(
            app.fetch(ResourceKind::Namespaces).unwrap().names(),
            vec!["team-a"]
        );
        assert_eq!(app.form().values().backup_namespace, "team-a");
    }

    #[test]
    fn fetch_failure_during_submit_keeps_submit_status() {
        let mut app = app();
        app.apply_action(Action::Submit);
        app.complete_fetch(FetchOutcome {
            kind: ResourceKind::ManagedClusters,
            result: Err(FetchError::new(ResourceKind::ManagedClusters, "timeout")),
        });

        assert_eq!(app.status(), "Submitting backup target");
        assert!(
            app.fetch(ResourceKind::ManagedClusters)
                .unwrap()
                .error
                .is_some()
        );
    }

    #[test]
    fn late_lists_clobber_select_choice_by_default() {
        let mut app = app();
        app.complete_fetch(loaded(ResourceKind::Namespaces, &["team-a", "team-b"]));
        app.apply_action(Action::PrevField);
        app.apply_action(Action::PrevField);
        app.apply_action(Action::NextOption);
        assert_eq!(app.form().values().backup_namespace, "team-b");

        app.complete_fetch(loaded(ResourceKind::ManagedClusters, &["spoke-1"]));
        assert_eq!(app.form().values().backup_namespace, "team-a");
    }

    #[test]
    fn typing_fills_text_fields() {
        let mut app = app();
        app.apply_action(Action::NextField);
        app.apply_action(Action::NextField);
        app.apply_action(Action::Activate);
        assert_eq!(app.mode(), InputMode::Editing);
        type_text(&mut app, "AK123");
        app.apply_action(Action::FinishEdit);

        assert_eq!(app.mode(), InputMode::Normal);
        assert_eq!(app.form().values().access_key, "AK123");
    }

    #[test]
    fn submit_captures_snapshot_and_blocks_resubmit() {
        let mut app = app();
        app.complete_fetch(loaded(ResourceKind::Namespaces, &["team-a"]));
        app.apply_action(Action::NextField);
        app.apply_action(Action::BeginEdit);
        type_text(&mut app, "SK456");

        let command = app.apply_action(Action::Submit);
        let AppCommand::Submit(config) = command else {
            panic!("expected submit command");
        };
        assert_eq!(config.secret_key, "SK456");
        assert_eq!(config.backup_namespace, "team-a");
        assert_eq!(app.mode(), InputMode::Normal);
        assert_eq!(app.submission(), &SubmissionState::Submitting);

        assert_eq!(app.apply_action(Action::Submit), AppCommand::None);
        assert_eq!(app.status(), "Submission already in progress");
    }

    #[test]
    fn enter_on_submit_button_submits() {
        let mut app = app();
        app.apply_action(Action::PrevField);
        assert!(matches!(
            app.apply_action(Action::Activate),
            AppCommand::Submit(_)
        ));
    }

    #[test]
    fn success_hands_off_to_policy_page() {
        let mut app = app();
        app.apply_action(Action::Submit);
        let command = app.complete_submission(Ok(vec![
            SubmissionStep::LabelCluster,
            SubmissionStep::CreateConfigMap,
            SubmissionStep::CreateSecret,
        ]));
        assert_eq!(
            command,
            AppCommand::OpenPolicyPage("/multicloud/governance/policies/create".to_string())
        );
        assert_eq!(app.submission().label(), "success");
    }

    #[test]
    fn reduced_variant_success_stays_on_page() {
        let settings = Settings {
            label_cluster: false,
            ..Settings::default()
        };
        let mut app = App::new(String::new(), String::new(), &settings);
        app.apply_action(Action::Submit);
        let command = app.complete_submission(Ok(vec![SubmissionStep::CreateConfigMap]));
        assert_eq!(command, AppCommand::None);
        assert_eq!(app.status(), "Backup target saved");
    }

    #[test]
    fn failure_is_surfaced_then_dismissed() {
        let mut app = app();
        app.apply_action(Action::Submit);
        let error = SubmissionError {
            step: SubmissionStep::CreateConfigMap,
            message: "already exists".to_string(),
            completed: vec![SubmissionStep::LabelCluster],
        };
        assert_eq!(app.complete_submission(Err(error)), AppCommand::None);
        assert_eq!(app.status(), "Submit failed: already exists");
        assert!(matches!(app.submission(), SubmissionState::Failed(_)));

        app.apply_action(Action::Dismiss);
        assert_eq!(app.submission(), &SubmissionState::Idle);

        assert!(matches!(
            app.apply_action(Action::Submit),
            AppCommand::Submit(_)
        ));
    }

    #[test]
    fn refresh_requests_visible_kinds() {
        let mut app = app();
        assert_eq!(
            app.apply_action(Action::Refresh),
            AppCommand::Fetch(vec![
                ResourceKind::Namespaces,
                ResourceKind::ManagedClusters
            ])
        );
    }

    #[test]
    fn license_field_mirrors_first_license() {
        let settings = Settings {
            show_license: true,
            ..Settings::default()
        };
        let mut app = App::new(String::new(), String::new(), &settings);
        app.complete_fetch(loaded(ResourceKind::Licenses, &["trilio-license", "other"]));
        assert_eq!(app.form().license(), Some("trilio-license"));
    }

    #[test]
    fn help_closes_on_next_action() {
        let mut app = app();
        app.apply_action(Action::ToggleHelp);
        assert!(app.show_help());
        app.apply_action(Action::Dismiss);
        assert!(!app.show_help());
        app.apply_action(Action::Quit);
        assert!(!app.running());
    }
}
