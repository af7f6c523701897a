use std::collections::HashSet;

/// Which parts of the merge-request tree are open.
///
/// Two independent axes: at most one merge request is expanded at a time,
/// while stages toggle freely per `(merge request, stage)` pair. Starts
/// empty, lives for the session only, and is mutated exclusively by the
/// toggle methods below so the transitions stay testable without any UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded_merge_request: Option<String>,
    expanded_stages: HashSet<String>,
}

/// Stage names are only unique within one pipeline, so stage expansion is
/// keyed by the parent merge request id as well.
fn stage_key(merge_request_id: &str, stage_name: &str) -> String {
    format!("{merge_request_id}-{stage_name}")
}

impl ExpansionState {
    /// Toggle a merge request open or closed.
    ///
    /// Opening one implicitly closes whichever other one was open.
    pub fn toggle_merge_request(&mut self, id: &str) {
        if self.expanded_merge_request.as_deref() == Some(id) {
            self.expanded_merge_request = None;
        } else {
            self.expanded_merge_request = Some(id.to_string());
        }
    }

    pub fn is_merge_request_expanded(&self, id: &str) -> bool {
        self.expanded_merge_request.as_deref() == Some(id)
    }

    /// Flip one stage's expansion, independent of every other stage.
    pub fn toggle_stage(&mut self, merge_request_id: &str, stage_name: &str) {
        let key = stage_key(merge_request_id, stage_name);
        if !self.expanded_stages.remove(&key) {
            self.expanded_stages.insert(key);
        }
    }

    pub fn is_stage_expanded(&self, merge_request_id: &str, stage_name: &str) -> bool {
        self.expanded_stages
            .contains(&stage_key(merge_request_id, stage_name))
    }

    pub fn clear(&mut self) {
        self.expanded_merge_request = None;
        self.expanded_stages.clear();
    }
}

/// Which setup input has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetupField {
    #[default]
    Token,
    ProjectPath,
}

/// Edit state of the configuration form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupForm {
    pub token: String,
    pub project_path: String,
    pub focus: SetupField,
}

impl SetupForm {
    /// Form pre-filled with the current configuration, for editing it.
    pub fn prefilled(token: &str, project_path: &str) -> Self {
        Self {
            token: token.to_string(),
            project_path: project_path.to_string(),
            focus: SetupField::Token,
        }
    }

    pub fn insert(&mut self, c: char) {
        if !c.is_control() {
            self.focused_value_mut().push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.focused_value_mut().pop();
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            SetupField::Token => SetupField::ProjectPath,
            SetupField::ProjectPath => SetupField::Token,
        };
    }

    /// Both values present; saving is only allowed once this holds.
    pub fn is_complete(&self) -> bool {
        !self.token.trim().is_empty() && !self.project_path.trim().is_empty()
    }

    fn focused_value_mut(&mut self) -> &mut String {
        match self.focus {
            SetupField::Token => &mut self.token,
            SetupField::ProjectPath => &mut self.project_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_merge_request_twice_closes_it() {
        let mut state = ExpansionState::default();

        state.toggle_merge_request("A");
        assert!(state.is_merge_request_expanded("A"));

        state.toggle_merge_request("A");
        assert!(!state.is_merge_request_expanded("A"));
        assert_eq!(state, ExpansionState::default());
    }

    #[test]
    fn test_opening_second_merge_request_closes_first() {
        let mut state = ExpansionState::default();

        state.toggle_merge_request("A");
        state.toggle_merge_request("B");

        assert!(!state.is_merge_request_expanded("A"));
        assert!(state.is_merge_request_expanded("B"));
    }

    #[test]
    fn test_stage_double_toggle_restores_membership() {
        let mut state = ExpansionState::default();

        state.toggle_stage("mr-1", "build");
        assert!(state.is_stage_expanded("mr-1", "build"));

        state.toggle_stage("mr-1", "build");
        assert!(!state.is_stage_expanded("mr-1", "build"));
    }

    #[test]
    fn test_stage_toggles_are_independent() {
        let mut state = ExpansionState::default();

        state.toggle_stage("mr-1", "build");
        state.toggle_stage("mr-2", "test");

        assert!(state.is_stage_expanded("mr-1", "build"));
        assert!(state.is_stage_expanded("mr-2", "test"));

        state.toggle_stage("mr-1", "build");
        assert!(!state.is_stage_expanded("mr-1", "build"));
        assert!(state.is_stage_expanded("mr-2", "test"));
    }

    #[test]
    fn test_stage_axis_ignores_merge_request_axis() {
        let mut state = ExpansionState::default();

        state.toggle_stage("mr-1", "build");
        state.toggle_merge_request("mr-1");
        state.toggle_merge_request("mr-1");

        // Collapsing a merge request leaves its stage set untouched.
        assert!(state.is_stage_expanded("mr-1", "build"));
    }

    #[test]
    fn test_form_editing() {
        let mut form = SetupForm::default();
        assert!(!form.is_complete());

        for c in "abc".chars() {
            form.insert(c);
        }
        form.focus_next();
        for c in "grp/proj".chars() {
            form.insert(c);
        }

        assert_eq!(form.token, "abc");
        assert_eq!(form.project_path, "grp/proj");
        assert!(form.is_complete());

        form.backspace();
        assert_eq!(form.project_path, "grp/pro");

        form.focus_next();
        form.backspace();
        assert_eq!(form.token, "ab");
    }

    #[test]
    fn test_form_ignores_control_characters() {
        let mut form = SetupForm::default();
        form.insert('\t');
        form.insert('\n');
        assert!(form.token.is_empty());
    }

    #[test]
    fn test_whitespace_only_form_is_incomplete() {
        let mut form = SetupForm::prefilled("  ", "grp/proj");
        assert!(!form.is_complete());
        form.focus = SetupField::Token;
        form.insert('x');
        assert!(form.is_complete());
    }
}
