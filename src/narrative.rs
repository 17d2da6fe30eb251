// src/narrative.rs
//
// Session state for interactive books: where the reader is, where they have
// been, and the named actions story content can trigger.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::chapter::ChapterId;

/// Author-defined handler: may mutate the session and optionally names the
/// next chapter.
pub type Handler = Rc<dyn Fn(&mut NarrativeState) -> Option<ChapterId>>;

/// Runs when a chapter is entered. Returning a chapter redirects there.
pub type Initializer = Rc<dyn Fn(&mut NarrativeState) -> Option<ChapterId>>;

#[derive(Clone)]
pub enum Action {
    /// Jump straight to a chapter.
    GoTo(ChapterId),
    Handler(Handler),
}

impl Action {
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(&mut NarrativeState) -> Option<ChapterId> + 'static,
    {
        Action::Handler(Rc::new(f))
    }

    fn run(&self, state: &mut NarrativeState) -> Option<ChapterId> {
        match self {
            Action::GoTo(id) => Some(*id),
            Action::Handler(f) => f(state),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::GoTo(id) => write!(f, "GoTo({})", id),
            Action::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActionTable {
    actions: HashMap<String, Action>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, action: Action) -> Option<Action> {
        self.actions.insert(name.into(), action)
    }

    pub fn with(mut self, name: impl Into<String>, action: Action) -> Self {
        self.insert(name, action);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NarrativeState {
    pub current_id: ChapterId,
    visited: Vec<ChapterId>,
    pub actions: ActionTable,
    pub variables: BTreeMap<String, Value>,
    pending_results: Vec<(String, String)>,
}

impl NarrativeState {
    pub fn new(actions: ActionTable) -> Self {
        Self {
            actions,
            ..Self::default()
        }
    }

    /// Makes `id` current and appends it to the visit history.
    pub fn enter(&mut self, id: ChapterId) {
        self.current_id = id;
        self.visited.push(id);
    }

    pub fn visited(&self) -> &[ChapterId] {
        &self.visited
    }

    pub fn passage_count(&self, id: ChapterId) -> usize {
        let count = self.visited.iter().filter(|&&v| v == id).count();
        log::debug!("passage_count({}) = {}", id.0, count);
        count
    }

    /// Queues markup for the `result_<n>` style output slot `slot`.
    pub fn write_result(&mut self, slot: impl Into<String>, html: impl Into<String>) {
        self.pending_results.push((slot.into(), html.into()));
    }

    pub fn take_results(&mut self) -> Vec<(String, String)> {
        std::mem::take(&mut self.pending_results)
    }

    pub fn snapshot(&self) -> NarrativeSnapshot {
        NarrativeSnapshot {
            current_id: self.current_id,
            visited: self.visited.clone(),
            variables: self.variables.clone(),
        }
    }
}

/// Read-only view of the session handed across the JS boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeSnapshot {
    pub current_id: ChapterId,
    pub visited: Vec<ChapterId>,
    pub variables: BTreeMap<String, Value>,
}

/// Resolves actions against the session table first, then the built-in table.
#[derive(Debug, Clone, Default)]
pub struct ActionDispatcher {
    defaults: ActionTable,
}

impl ActionDispatcher {
    pub fn new(defaults: ActionTable) -> Self {
        Self { defaults }
    }

    pub fn defaults_mut(&mut self) -> &mut ActionTable {
        &mut self.defaults
    }

    pub fn perform(&self, state: &mut NarrativeState, name: &str) -> Option<ChapterId> {
        let action = state
            .actions
            .get(name)
            .or_else(|| self.defaults.get(name))
            .cloned();
        match action {
            Some(action) => {
                let result = action.run(state);
                log::debug!("action {} -> {:?}", name, result);
                result
            }
            None => {
                log::debug!("no handler for action {}", name);
                None
            }
        }
    }
}

/// Everything an interactive book hands to the reader at startup.
#[derive(Clone, Default)]
pub struct Story {
    pub initializers: Vec<Option<Initializer>>,
    pub actions: ActionTable,
    pub default_actions: ActionTable,
    pub new_game: Option<Rc<dyn Fn(&mut NarrativeState)>>,
}

impl Story {
    pub fn set_initializer<F>(&mut self, chapter: ChapterId, f: F)
    where
        F: Fn(&mut NarrativeState) -> Option<ChapterId> + 'static,
    {
        if self.initializers.len() <= chapter.0 {
            self.initializers.resize(chapter.0 + 1, None);
        }
        self.initializers[chapter.0] = Some(Rc::new(f));
    }
}

impl fmt::Debug for Story {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Story")
            .field("initializers", &self.initializers.len())
            .field("actions", &self.actions)
            .field("default_actions", &self.default_actions)
            .field("new_game", &self.new_game.is_some())
            .finish()
    }
}

/// Live interactive session: state, dispatcher and per-chapter initializers.
pub struct Narrative {
    pub state: NarrativeState,
    pub dispatcher: ActionDispatcher,
    initializers: Vec<Option<Initializer>>,
}

impl Narrative {
    pub fn start(story: Story) -> Self {
        let mut state = NarrativeState::new(story.actions);
        if let Some(new_game) = &story.new_game {
            new_game(&mut state);
        }
        Self {
            state,
            dispatcher: ActionDispatcher::new(story.default_actions),
            initializers: story.initializers,
        }
    }

    pub fn perform(&mut self, name: &str) -> Option<ChapterId> {
        self.dispatcher.perform(&mut self.state, name)
    }

    pub fn set_initializer(&mut self, chapter: ChapterId, init: Initializer) {
        if self.initializers.len() <= chapter.0 {
            self.initializers.resize(chapter.0 + 1, None);
        }
        self.initializers[chapter.0] = Some(init);
    }

    /// Records the visit and runs the chapter initializer, if any.
    pub fn enter(&mut self, id: ChapterId) -> Option<ChapterId> {
        self.state.enter(id);
        let init = self.initializers.get(id.0).cloned().flatten()?;
        init(&mut self.state)
    }
}

/// Edits a script handler made to the state object it was given. Unknown
/// fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScriptEdits {
    pub variables: Option<BTreeMap<String, Value>>,
}

/// Narrative view lent to a script handler while the session itself is busy
/// running it. Reads come from the snapshot taken when the handler started;
/// result writes are queued and applied when the scope closes.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptScope {
    snapshot: NarrativeSnapshot,
    results: Vec<(String, String)>,
}

impl ScriptScope {
    pub fn open(state: &NarrativeState) -> Self {
        Self {
            snapshot: state.snapshot(),
            results: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> &NarrativeSnapshot {
        &self.snapshot
    }

    pub fn passage_count(&self, id: ChapterId) -> usize {
        self.snapshot.visited.iter().filter(|&&v| v == id).count()
    }

    pub fn write_result(&mut self, slot: impl Into<String>, html: impl Into<String>) {
        self.results.push((slot.into(), html.into()));
    }

    /// Applies queued results and, when the handler returned its state object
    /// intact, the variables it left there.
    pub fn close(self, state: &mut NarrativeState, edits: Option<ScriptEdits>) {
        if let Some(variables) = edits.and_then(|e| e.variables) {
            state.variables = variables;
        }
        for (slot, html) in self.results {
            state.write_result(slot, html);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passage_count() {
        let mut state = NarrativeState::default();
        for id in [0, 1, 0, 2] {
            state.enter(ChapterId(id));
        }
        assert_eq!(state.passage_count(ChapterId(0)), 2);
        assert_eq!(state.passage_count(ChapterId(1)), 1);
        assert_eq!(state.passage_count(ChapterId(5)), 0);
        assert_eq!(state.current_id, ChapterId(2));
    }

    #[test]
    fn test_story_actions_shadow_defaults() {
        let story_actions = ActionTable::new().with(
            "open",
            Action::handler(|state| {
                state.variables.insert("door".into(), Value::from("story"));
                Some(ChapterId(2))
            }),
        );
        let defaults = ActionTable::new()
            .with(
                "open",
                Action::handler(|state| {
                    state.variables.insert("door".into(), Value::from("default"));
                    Some(ChapterId(9))
                }),
            )
            .with("home", Action::GoTo(ChapterId(0)));

        let dispatcher = ActionDispatcher::new(defaults);
        let mut state = NarrativeState::new(story_actions);

        assert_eq!(dispatcher.perform(&mut state, "open"), Some(ChapterId(2)));
        assert_eq!(state.variables.get("door"), Some(&Value::from("story")));
        assert_eq!(dispatcher.perform(&mut state, "home"), Some(ChapterId(0)));
    }

    #[test]
    fn test_unknown_action_is_noop() {
        let dispatcher = ActionDispatcher::default();
        let mut state = NarrativeState::default();
        assert_eq!(dispatcher.perform(&mut state, "missing"), None);
        assert!(state.visited().is_empty());
    }

    #[test]
    fn test_handler_can_mutate_state() {
        let mut narrative = Narrative::start(Story {
            actions: ActionTable::new().with(
                "again",
                Action::handler(|state| {
                    let seen = state.passage_count(state.current_id);
                    if seen > 1 {
                        Some(ChapterId(3))
                    } else {
                        None
                    }
                }),
            ),
            ..Story::default()
        });
        narrative.enter(ChapterId(1));
        assert_eq!(narrative.perform("again"), None);
        narrative.enter(ChapterId(1));
        assert_eq!(narrative.perform("again"), Some(ChapterId(3)));
    }

    #[test]
    fn test_new_game_runs_once_at_start() {
        let story = Story {
            new_game: Some(Rc::new(|state: &mut NarrativeState| {
                state.variables.insert("gold".into(), Value::from(10));
            })),
            ..Story::default()
        };
        let narrative = Narrative::start(story);
        assert_eq!(narrative.state.variables.get("gold"), Some(&Value::from(10)));
    }

    #[test]
    fn test_initializer_writes_results_and_redirects() {
        let mut story = Story::default();
        story.set_initializer(ChapterId(1), |state| {
            state.write_result("result_0", "<p>welcome back</p>");
            if state.passage_count(ChapterId(1)) > 1 {
                Some(ChapterId(2))
            } else {
                None
            }
        });
        let mut narrative = Narrative::start(story);

        assert_eq!(narrative.enter(ChapterId(0)), None);
        assert_eq!(narrative.enter(ChapterId(1)), None);
        assert_eq!(
            narrative.state.take_results(),
            vec![("result_0".to_string(), "<p>welcome back</p>".to_string())]
        );
        assert_eq!(narrative.enter(ChapterId(1)), Some(ChapterId(2)));
        assert_eq!(
            narrative.state.visited(),
            &[ChapterId(0), ChapterId(1), ChapterId(1)]
        );
    }

    #[test]
    fn test_script_scope_reads_snapshot_and_queues_results() {
        let mut state = NarrativeState::default();
        for id in [0, 1, 0] {
            state.enter(ChapterId(id));
        }
        let mut scope = ScriptScope::open(&state);
        assert_eq!(scope.passage_count(ChapterId(0)), 2);
        assert_eq!(scope.passage_count(ChapterId(1)), 1);
        assert_eq!(scope.snapshot().current_id, ChapterId(0));

        scope.write_result("result_0", "<em>again</em>");
        let edits: ScriptEdits =
            serde_json::from_str(r#"{"current_id": 0, "visited": [], "variables": {"lamp": true}}"#)
                .unwrap();
        scope.close(&mut state, Some(edits));

        assert_eq!(state.variables.get("lamp"), Some(&Value::Bool(true)));
        assert_eq!(
            state.take_results(),
            vec![("result_0".to_string(), "<em>again</em>".to_string())]
        );
        // history is never rewritten by a script
        assert_eq!(state.visited(), [ChapterId(0), ChapterId(1), ChapterId(0)]);
    }

    #[test]
    fn test_script_scope_without_edits_keeps_variables() {
        let mut state = NarrativeState::default();
        state.variables.insert("gold".into(), Value::from(3));

        ScriptScope::open(&state).close(&mut state, None);
        let edits: ScriptEdits = serde_json::from_str("{}").unwrap();
        ScriptScope::open(&state).close(&mut state, Some(edits));

        assert_eq!(state.variables.get("gold"), Some(&Value::from(3)));
    }
}
