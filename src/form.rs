use std::collections::HashSet;

use crate::cli::DefaultsPolicy;
use crate::model::{BackupConfig, FormField};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FormFocus {
    Field(FormField),
    Submit,
}

#[derive(Debug, Clone)]
pub struct BackupForm {
    values: BackupConfig,
    focus_index: usize,
    editing: bool,
    touched: HashSet<FormField>,
    defaults: DefaultsPolicy,
    license: Option<String>,
}

impl BackupForm {
    pub fn new(defaults: DefaultsPolicy) -> Self {
        Self {
            values: BackupConfig::default(),
            focus_index: 0,
            editing: false,
            touched: HashSet::new(),
            defaults,
            license: None,
        }
    }

    pub fn values(&self) -> &BackupConfig {
        &self.values
    }

    pub fn snapshot(&self) -> BackupConfig {
        self.values.clone()
    }

    pub fn focus(&self) -> FormFocus {
        FormField::ALL
            .get(self.focus_index)
            .copied()
            .map(FormFocus::Field)
            .unwrap_or(FormFocus::Submit)
    }

    pub fn focused_field(&self) -> Option<FormField> {
        match self.focus() {
            FormFocus::Field(field) => Some(field),
            FormFocus::Submit => None,
        }
    }

    pub fn editing(&self) -> bool {
        self.editing
    }

    pub fn license(&self) -> Option<&str> {
        self.license.as_deref()
    }

    pub fn move_focus(&mut self, delta: isize) {
        if self.editing {
            return;
        }
        let slots = FormField::ALL.len() as isize + 1;
        let next = (self.focus_index as isize + delta).rem_euclid(slots);
        self.focus_index = next as usize;
    }

    pub fn begin_edit(&mut self) -> bool {
        match self.focused_field() {
            Some(field) if field.options_source().is_none() => {
                self.editing = true;
                true
            }
            _ => false,
        }
    }

    pub fn end_edit(&mut self) {
        self.editing = false;
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.editing_field() {
            self.values.value_mut(field).push(c);
            self.touched.insert(field);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(field) = self.editing_field() {
            self.values.value_mut(field).pop();
            self.touched.insert(field);
        }
    }

    /// Steps a select field through `options`. Returns false when focus is not on a select.
    pub fn cycle_option(&mut self, options: &[String], delta: isize) -> bool {
        let Some(field) = self
            .focused_field()
            .filter(|field| field.options_source().is_some())
        else {
            return false;
        };
        if options.is_empty() {
            return true;
        }

        let current = self.values.value(field);
        let len = options.len() as isize;
        let next = match options.iter().position(|option| option == current) {
            Some(index) => (index as isize + delta).rem_euclid(len),
            None if delta < 0 => len - 1,
            None => 0,
        };
        *self.values.value_mut(field) = options[next as usize].clone();
        self.touched.insert(field);
        true
    }

    pub fn apply_defaults(&mut self, first_namespace: Option<&str>, first_cluster: Option<&str>) {
        if let Some(namespace) = first_namespace {
            self.apply_default(FormField::BackupNamespace, namespace);
        }
        if let Some(cluster) = first_cluster {
            self.apply_default(FormField::SourceCluster, cluster);
        }
    }

    pub fn set_license(&mut self, first_license: Option<&str>) {
        self.license = first_license.map(str::to_string);
    }

    fn apply_default(&mut self, field: FormField, value: &str) {
        if self.defaults == DefaultsPolicy::Preserve && self.touched.contains(&field) {
            return;
        }
        *self.values.value_mut(field) = value.to_string();
    }

    fn editing_field(&self) -> Option<FormField> {
        if self.editing {
            self.focused_field()
        } else {
            None
        }
    }

    #[cfg(test)]
    pub fn set_value(&mut self, field: FormField, value: &str) {
        *self.values.value_mut(field) = value.to_string();
        self.touched.insert(field);
    }
}

#[cfg(test)]
mod tests {
    use super::{BackupForm, FormFocus};
    use crate::cli::DefaultsPolicy;
    use crate::model::{BackupConfig, FormField};

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn starts_empty_on_the_first_field() {
        let form = BackupForm::new(DefaultsPolicy::Overwrite);
        assert_eq!(form.values(), &BackupConfig::default());
        assert_eq!(form.focus(), FormFocus::Field(FormField::SourceCluster));
        assert!(!form.editing());
    }

    #[test]
    fn defaults_take_first_names() {
        let mut form = BackupForm::new(DefaultsPolicy::Overwrite);
        form.apply_defaults(Some("team-a"), Some("spoke-1"));
        assert_eq!(form.values().backup_namespace, "team-a");
        assert_eq!(form.values().source_cluster, "spoke-1");
    }

    #[test]
    fn empty_lists_leave_fields_unset() {
        let mut form = BackupForm::new(DefaultsPolicy::Overwrite);
        form.apply_defaults(None, None);
        assert!(form.values().backup_namespace.is_empty());
        assert!(form.values().source_cluster.is_empty());
    }

    #[test]
    fn overwrite_policy_clobbers_earlier_choice() {
        let mut form = BackupForm::new(DefaultsPolicy::Overwrite);
        form.set_value(FormField::BackupNamespace, "team-b");
        form.apply_defaults(Some("team-a"), None);
        assert_eq!(form.values().backup_namespace, "team-a");
    }

    #[test]
    fn preserve_policy_keeps_touched_fields() {
        let mut form = BackupForm::new(DefaultsPolicy::Preserve);
        form.set_value(FormField::BackupNamespace, "team-b");
        form.apply_defaults(Some("team-a"), Some("spoke-1"));
        assert_eq!(form.values().backup_namespace, "team-b");
        assert_eq!(form.values().source_cluster, "spoke-1");
    }

    #[test]
    fn focus_wraps_through_submit() {
        let mut form = BackupForm::new(DefaultsPolicy::Overwrite);
        form.move_focus(-1);
        assert_eq!(form.focus(), FormFocus::Submit);
        form.move_focus(1);
        assert_eq!(form.focus(), FormFocus::Field(FormField::SourceCluster));
        form.move_focus(6);
        assert_eq!(form.focus(), FormFocus::Submit);
    }

    #[test]
    fn text_fields_take_typed_input() {
        let mut form = BackupForm::new(DefaultsPolicy::Overwrite);
        form.move_focus(3);
        assert_eq!(form.focused_field(), Some(FormField::BucketName));
        assert!(form.begin_edit());
        for c in "my-bucketx".chars() {
            form.push_char(c);
        }
        form.pop_char();
        form.end_edit();
        form.push_char('z');
        assert_eq!(form.values().bucket_name, "my-bucket");
    }

    #[test]
    fn select_fields_refuse_edit_mode() {
        let mut form = BackupForm::new(DefaultsPolicy::Overwrite);
        assert!(!form.begin_edit());
        assert!(!form.editing());
    }

    #[test]
    fn cycling_walks_the_fetched_options() {
        let mut form = BackupForm::new(DefaultsPolicy::Overwrite);
        let clusters = names(&["spoke-1", "spoke-2", "spoke-3"]);
        form.apply_defaults(None, Some("spoke-1"));

        assert!(form.cycle_option(&clusters, 1));
        assert_eq!(form.values().source_cluster, "spoke-2");
        assert!(form.cycle_option(&clusters, -2));
        assert_eq!(form.values().source_cluster, "spoke-3");
    }

    #[test]
    fn cycling_ignores_text_fields() {
        let mut form = BackupForm::new(DefaultsPolicy::Overwrite);
        form.move_focus(4);
        assert!(!form.cycle_option(&names(&["a"]), 1));
        assert!(form.values().region.is_empty());
    }

    #[test]
    fn license_mirrors_first_record() {
        let mut form = BackupForm::new(DefaultsPolicy::Overwrite);
        form.set_license(Some("trilio-license"));
        assert_eq!(form.license(), Some("trilio-license"));
        assert!(!format!("{:?}", form.snapshot()).contains("trilio-license"));
    }
}
