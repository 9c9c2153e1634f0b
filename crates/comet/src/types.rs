use crate::action::ActionKind;
use crate::error::{CometError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;

// ============================================================================
// Notebook
// ============================================================================

/// A notebook snapshot: an ordered sequence of cells.
///
/// The JSON shape is nbformat v4. Only `cells` is interpreted; every other
/// top-level key (`metadata`, `nbformat`, `nbformat_minor`) is carried in
/// `extra` so that a stored snapshot round-trips unchanged.
///
/// Cells have no identity of their own. Two notebooks are always compared
/// position by position.
///
/// # JSON shape
///
/// ```json
/// {
///   "cells": [
///     { "cell_type": "markdown", "source": "# Title", "metadata": {} },
///     { "cell_type": "code", "source": ["x = 1\n", "x"], "outputs": [], "execution_count": null, "metadata": {} }
///   ],
///   "metadata": {},
///   "nbformat": 4,
///   "nbformat_minor": 2
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    /// Additional properties, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Notebook {
    /// Build a notebook with the default nbformat v4 header.
    pub fn new(cells: Vec<Cell>) -> Self {
        let mut extra = Map::new();
        extra.insert("metadata".to_string(), Value::Object(Map::new()));
        extra.insert("nbformat".to_string(), Value::from(4));
        extra.insert("nbformat_minor".to_string(), Value::from(2));
        Self { cells, extra }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(CometError::MalformedNotebook)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// ============================================================================
// Cell
// ============================================================================

/// The three nbformat cell types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Code,
    Markdown,
    Raw,
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellKind::Code => write!(f, "code"),
            CellKind::Markdown => write!(f, "markdown"),
            CellKind::Raw => write!(f, "raw"),
        }
    }
}

/// One cell of a notebook.
///
/// `outputs` is only meaningful for code cells. A code cell read without an
/// `outputs` key behaves as if it had none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: CellKind,
    pub source: Text,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<Output>>,
    /// Additional properties (`metadata`, `execution_count`, `id`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cell {
    /// A code cell with no outputs and no execution count.
    pub fn code(source: impl Into<Text>) -> Self {
        let mut extra = Map::new();
        extra.insert("metadata".to_string(), Value::Object(Map::new()));
        extra.insert("execution_count".to_string(), Value::Null);
        Self {
            cell_type: CellKind::Code,
            source: source.into(),
            outputs: Some(Vec::new()),
            extra,
        }
    }

    pub fn markdown(source: impl Into<Text>) -> Self {
        Self::text_cell(CellKind::Markdown, source.into())
    }

    pub fn raw(source: impl Into<Text>) -> Self {
        Self::text_cell(CellKind::Raw, source.into())
    }

    fn text_cell(cell_type: CellKind, source: Text) -> Self {
        let mut extra = Map::new();
        extra.insert("metadata".to_string(), Value::Object(Map::new()));
        Self {
            cell_type,
            source,
            outputs: None,
            extra,
        }
    }

    /// Append an output. Only code cells carry outputs; on other kinds this
    /// is a no-op.
    pub fn with_output(mut self, output: Output) -> Self {
        if self.cell_type == CellKind::Code {
            self.outputs.get_or_insert_with(Vec::new).push(output);
        }
        self
    }

    pub fn kind(&self) -> CellKind {
        self.cell_type
    }

    pub fn outputs(&self) -> &[Output] {
        self.outputs.as_deref().unwrap_or_default()
    }
}

// ============================================================================
// Text
// ============================================================================

/// Multi-line text as nbformat stores it.
///
/// On disk nbformat writes `source` and stream `text` as a list of lines;
/// the browser sends a single string. Both forms read into the same joined
/// string, so the two compare equal. Always written back as one string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Text(String);

impl Text {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for Text {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Text(s.to_string())
    }
}

impl From<String> for Text {
    fn from(s: String) -> Self {
        Text(s)
    }
}

impl Serialize for Text {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Joined(String),
            Lines(Vec<String>),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Joined(s) => Text(s),
            Repr::Lines(lines) => Text(lines.concat()),
        })
    }
}

// ============================================================================
// Outputs
// ============================================================================

/// A mime-type keyed output bundle (`data` of display and execute results).
///
/// Values stored as lists of lines are joined on read for every mime type
/// except JSON ones, matching nbformat's own read normalisation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct MimeBundle(BTreeMap<String, Value>);

impl MimeBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, mime: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(mime.into(), value.into());
        self
    }

    pub fn get(&self, mime: &str) -> Option<&Value> {
        self.0.get(mime)
    }

    pub fn mime_types(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<BTreeMap<String, Value>> for MimeBundle {
    fn from(mut map: BTreeMap<String, Value>) -> Self {
        for (mime, value) in map.iter_mut() {
            if mime.ends_with("json") {
                continue;
            }
            if let Value::Array(items) = value
                && items.iter().all(Value::is_string)
            {
                let joined: String = items.iter().filter_map(Value::as_str).collect();
                *value = Value::String(joined);
            }
        }
        MimeBundle(map)
    }
}

/// One execution artifact of a code cell, tagged by `output_type`.
///
/// Output types this crate does not know (or known tags whose payload is not
/// well formed) are kept as [`Output::Other`] so nothing is lost on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "OutputRepr", into = "OutputRepr")]
pub enum Output {
    Stream {
        name: String,
        text: Text,
    },
    DisplayData {
        data: MimeBundle,
        metadata: Map<String, Value>,
    },
    ExecuteResult {
        data: MimeBundle,
        metadata: Map<String, Value>,
        execution_count: Option<i64>,
    },
    Error {
        ename: String,
        evalue: String,
        traceback: Vec<String>,
    },
    Other(Value),
}

impl Output {
    pub fn stream(name: impl Into<String>, text: impl Into<Text>) -> Self {
        Output::Stream {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn display_data(data: MimeBundle) -> Self {
        Output::DisplayData {
            data,
            metadata: Map::new(),
        }
    }

    pub fn execute_result(data: MimeBundle, execution_count: Option<i64>) -> Self {
        Output::ExecuteResult {
            data,
            metadata: Map::new(),
            execution_count,
        }
    }

    pub fn error(ename: impl Into<String>, evalue: impl Into<String>) -> Self {
        Output::Error {
            ename: ename.into(),
            evalue: evalue.into(),
            traceback: Vec::new(),
        }
    }

    /// The nbformat `output_type` tag. For unrecognised outputs this is
    /// whatever tag the JSON carried, or `""` if it had none.
    pub fn output_type(&self) -> &str {
        match self {
            Output::Stream { .. } => "stream",
            Output::DisplayData { .. } => "display_data",
            Output::ExecuteResult { .. } => "execute_result",
            Output::Error { .. } => "error",
            Output::Other(value) => value
                .get("output_type")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum OutputRepr {
    Known(KnownOutput),
    Other(Value),
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
enum KnownOutput {
    Stream {
        #[serde(default = "default_stream_name")]
        name: String,
        text: Text,
    },
    DisplayData {
        data: MimeBundle,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    ExecuteResult {
        data: MimeBundle,
        #[serde(default)]
        metadata: Map<String, Value>,
        #[serde(default)]
        execution_count: Option<i64>,
    },
    Error {
        #[serde(default)]
        ename: String,
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
}

fn default_stream_name() -> String {
    "stdout".to_string()
}

impl From<OutputRepr> for Output {
    fn from(repr: OutputRepr) -> Self {
        match repr {
            OutputRepr::Known(KnownOutput::Stream { name, text }) => Output::Stream { name, text },
            OutputRepr::Known(KnownOutput::DisplayData { data, metadata }) => {
                Output::DisplayData { data, metadata }
            }
            OutputRepr::Known(KnownOutput::ExecuteResult {
                data,
                metadata,
                execution_count,
            }) => Output::ExecuteResult {
                data,
                metadata,
                execution_count,
            },
            OutputRepr::Known(KnownOutput::Error {
                ename,
                evalue,
                traceback,
            }) => Output::Error {
                ename,
                evalue,
                traceback,
            },
            OutputRepr::Other(value) => Output::Other(value),
        }
    }
}

impl From<Output> for OutputRepr {
    fn from(output: Output) -> Self {
        match output {
            Output::Stream { name, text } => OutputRepr::Known(KnownOutput::Stream { name, text }),
            Output::DisplayData { data, metadata } => {
                OutputRepr::Known(KnownOutput::DisplayData { data, metadata })
            }
            Output::ExecuteResult {
                data,
                metadata,
                execution_count,
            } => OutputRepr::Known(KnownOutput::ExecuteResult {
                data,
                metadata,
                execution_count,
            }),
            Output::Error {
                ename,
                evalue,
                traceback,
            } => OutputRepr::Known(KnownOutput::Error {
                ename,
                evalue,
                traceback,
            }),
            Output::Other(value) => OutputRepr::Other(value),
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

/// One editor action as reported by the notebook front end.
///
/// The front end never sends a patch, only the action label, the selection
/// at the time of the action, and the whole current notebook.
///
/// `index` and `indices` are signed: the front end reports `-1` when nothing
/// is selected.
///
/// # JSON shape
///
/// ```json
/// {
///   "time": 1490812345678,
///   "name": "run-cell",
///   "index": 2,
///   "indices": [2],
///   "model": { "cells": [ … ], "metadata": {}, "nbformat": 4, "nbformat_minor": 2 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub time: i64,
    #[serde(rename = "name")]
    pub kind: ActionKind,
    #[serde(rename = "index")]
    pub selected_index: i64,
    #[serde(rename = "indices")]
    pub selected_indices: Vec<i64>,
    #[serde(rename = "model")]
    pub document: Notebook,
}

impl ActionDescriptor {
    pub fn new(kind: ActionKind, selected_index: i64, document: Notebook) -> Self {
        Self {
            time: 0,
            kind,
            selected_index,
            selected_indices: vec![selected_index],
            document,
        }
    }

    pub fn with_time(mut self, time: i64) -> Self {
        self.time = time;
        self
    }

    pub fn with_selection(mut self, indices: Vec<i64>) -> Self {
        self.selected_indices = indices;
        self
    }

    /// Parse a descriptor. Any missing or mistyped field is reported as
    /// [`CometError::MalformedAction`].
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(CometError::MalformedAction)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(CometError::MalformedAction)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// Diff result
// ============================================================================

/// Cells an action actually changed, keyed by their index in the current
/// notebook. Keys are unique; iteration order is ascending but carries no
/// meaning.
///
/// Serialises as a JSON object keyed by the decimal index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffResult(BTreeMap<usize, Cell>);

impl DiffResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a changed cell. A repeated index keeps the latest cell.
    pub fn insert(&mut self, index: usize, cell: Cell) {
        self.0.insert(index, cell);
    }

    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.0.get(&index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.0.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Cell)> {
        self.0.iter().map(|(i, c)| (*i, c))
    }
}

// ============================================================================
// Log entries and identities
// ============================================================================

/// The tuple handed to the action log for every processed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub time: i64,
    pub name: ActionKind,
    pub index: i64,
    pub indices: Vec<i64>,
    pub diff: DiffResult,
}

impl LogEntry {
    pub fn new(action: &ActionDescriptor, diff: &DiffResult) -> Self {
        Self {
            time: action.time,
            name: action.kind.clone(),
            index: action.selected_index,
            indices: action.selected_indices.clone(),
            diff: diff.clone(),
        }
    }

    /// Whether both entries record the same action: equal time, name and
    /// selected index. Entries without a time never match, since repeats of
    /// an untimed action cannot be told apart from a retry.
    pub fn same_action(&self, other: &LogEntry) -> bool {
        self.time > 0
            && self.time == other.time
            && self.name == other.name
            && self.index == other.index
    }
}

/// Stable key naming which notebook an action and its stored state belong
/// to. Opaque to this crate; storage decides what it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotebookId(String);

impl NotebookId {
    pub fn new(id: impl Into<String>) -> Self {
        NotebookId(id.into())
    }

    /// Identity of a notebook file: its file stem (`analysis.ipynb` →
    /// `analysis`).
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map(NotebookId::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotebookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ── Text ───────────────────────────────────────────────────────────

    #[test]
    fn test_text_from_lines_joins() {
        let text: Text = serde_json::from_value(json!(["a = 1\n", "b = 2"])).unwrap();
        assert_eq!(text.as_str(), "a = 1\nb = 2");
    }

    #[test]
    fn test_text_serializes_as_string() {
        let text = Text::from("x\ny");
        assert_eq!(serde_json::to_value(&text).unwrap(), json!("x\ny"));
    }

    #[test]
    fn test_text_rejects_non_text() {
        assert!(serde_json::from_value::<Text>(json!(42)).is_err());
    }

    // ── Notebook ───────────────────────────────────────────────────────

    #[test]
    fn test_notebook_parses_nbformat_shape() {
        let nb = Notebook::from_json(
            r##"{
                "cells": [
                    {"cell_type": "markdown", "source": ["# Title"], "metadata": {}},
                    {"cell_type": "code", "source": "1 + 1", "metadata": {},
                     "execution_count": 3,
                     "outputs": [{"output_type": "execute_result", "execution_count": 3,
                                  "data": {"text/plain": ["2"]}, "metadata": {}}]}
                ],
                "metadata": {"kernelspec": {"name": "python3"}},
                "nbformat": 4,
                "nbformat_minor": 2
            }"##,
        )
        .unwrap();
        assert_eq!(nb.len(), 2);
        assert_eq!(nb.cells[0].kind(), CellKind::Markdown);
        assert_eq!(nb.cells[0].source.as_str(), "# Title");
        assert!(nb.cells[0].outputs().is_empty());
        match &nb.cells[1].outputs()[0] {
            Output::ExecuteResult {
                data,
                execution_count,
                ..
            } => {
                assert_eq!(data.get("text/plain"), Some(&json!("2")));
                assert_eq!(*execution_count, Some(3));
            }
            other => panic!("Expected ExecuteResult, got {other:?}"),
        }
        assert_eq!(nb.extra["nbformat"], json!(4));
        assert_eq!(nb.cells[1].extra["execution_count"], json!(3));
    }

    #[test]
    fn test_notebook_missing_cells_is_malformed() {
        let err = Notebook::from_json(r#"{"metadata": {}}"#).unwrap_err();
        assert!(matches!(err, CometError::MalformedNotebook(_)));
    }

    #[test]
    fn test_unknown_cell_type_is_malformed() {
        let result = Notebook::from_json(r#"{"cells": [{"cell_type": "heading", "source": ""}]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_notebook_preserves_extra_fields() {
        let nb = Notebook::new(vec![Cell::markdown("hi")]);
        let json = nb.to_json().unwrap();
        let back = Notebook::from_json(&json).unwrap();
        assert_eq!(back, nb);
        assert!(json.contains("\"nbformat\":4"));
    }

    #[test]
    fn test_non_code_cell_omits_outputs() {
        let value = serde_json::to_value(Cell::markdown("# x")).unwrap();
        assert!(value.get("outputs").is_none());
        let value = serde_json::to_value(Cell::code("x")).unwrap();
        assert_eq!(value["outputs"], json!([]));
        assert_eq!(value["execution_count"], json!(null));
    }

    #[test]
    fn test_with_output_ignored_on_markdown() {
        let cell = Cell::markdown("# x").with_output(Output::stream("stdout", "hi"));
        assert!(cell.outputs().is_empty());
    }

    // ── Outputs ────────────────────────────────────────────────────────

    #[test]
    fn test_stream_output_lines_joined() {
        let out: Output = serde_json::from_value(json!({
            "output_type": "stream", "name": "stdout", "text": ["a\n", "b\n"]
        }))
        .unwrap();
        assert_eq!(out, Output::stream("stdout", "a\nb\n"));
    }

    #[test]
    fn test_error_output_keeps_traceback() {
        let out: Output = serde_json::from_value(json!({
            "output_type": "error", "ename": "NameError", "evalue": "name 'x' is not defined",
            "traceback": ["line 1"]
        }))
        .unwrap();
        match out {
            Output::Error {
                ename, traceback, ..
            } => {
                assert_eq!(ename, "NameError");
                assert_eq!(traceback, vec!["line 1".to_string()]);
            }
            other => panic!("Expected Error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_output_kept_opaque() {
        let raw = json!({"output_type": "pyout", "prompt_number": 1});
        let out: Output = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(out.output_type(), "pyout");
        assert_eq!(serde_json::to_value(&out).unwrap(), raw);
    }

    #[test]
    fn test_known_output_serializes_with_tag() {
        let value = serde_json::to_value(Output::error("ValueError", "bad")).unwrap();
        assert_eq!(value["output_type"], json!("error"));
        assert_eq!(value["evalue"], json!("bad"));
    }

    #[test]
    fn test_mime_bundle_joins_text_but_not_json() {
        let bundle: MimeBundle = serde_json::from_value(json!({
            "text/html": ["<b>", "x</b>"],
            "application/json": ["a", "b"]
        }))
        .unwrap();
        assert_eq!(bundle.get("text/html"), Some(&json!("<b>x</b>")));
        assert_eq!(bundle.get("application/json"), Some(&json!(["a", "b"])));
    }

    // ── ActionDescriptor ───────────────────────────────────────────────

    #[test]
    fn test_action_descriptor_from_wire() {
        let action = ActionDescriptor::from_json(
            r#"{"time": 1490812345678, "name": "insert-cell-below", "index": 1,
                "indices": [1], "model": {"cells": []}}"#,
        )
        .unwrap();
        assert_eq!(action.kind, ActionKind::InsertCellBelow);
        assert_eq!(action.selected_index, 1);
        assert_eq!(action.selected_indices, vec![1]);
        assert_eq!(action.time, 1490812345678);
    }

    #[test]
    fn test_action_descriptor_missing_model() {
        let err = ActionDescriptor::from_json(
            r#"{"time": 1, "name": "run-cell", "index": 0, "indices": [0]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CometError::MalformedAction(_)));
    }

    #[test]
    fn test_action_descriptor_wrong_shape() {
        let err = ActionDescriptor::from_json(
            r#"{"time": 1, "name": "run-cell", "index": "zero", "indices": [0], "model": {"cells": []}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CometError::MalformedAction(_)));
    }

    #[test]
    fn test_action_descriptor_unknown_name_accepted() {
        let action = ActionDescriptor::from_json(
            r#"{"time": 1, "name": "save-notebook", "index": -1, "indices": [], "model": {"cells": []}}"#,
        )
        .unwrap();
        assert_eq!(action.kind, ActionKind::Unrecognized("save-notebook".into()));
        assert_eq!(action.selected_index, -1);
    }

    // ── DiffResult ─────────────────────────────────────────────────────

    #[test]
    fn test_diff_result_keys_serialize_as_strings() {
        let mut diff = DiffResult::new();
        diff.insert(2, Cell::code("x"));
        let value = serde_json::to_value(&diff).unwrap();
        assert!(value.get("2").is_some());
        let back: DiffResult = serde_json::from_value(value).unwrap();
        assert_eq!(back, diff);
    }

    #[test]
    fn test_diff_result_duplicate_index_collapses() {
        let mut diff = DiffResult::new();
        diff.insert(1, Cell::code("a"));
        diff.insert(1, Cell::code("b"));
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.get(1).unwrap().source.as_str(), "b");
    }

    #[test]
    fn test_log_entry_same_action() {
        let doc = Notebook::new(vec![Cell::code("x")]);
        let at = |time, index| {
            let action = ActionDescriptor::new(ActionKind::RunCell, index, doc.clone()).with_time(time);
            LogEntry::new(&action, &DiffResult::new())
        };
        assert!(at(5, 1).same_action(&at(5, 1)));
        assert!(!at(5, 1).same_action(&at(6, 1)));
        assert!(!at(5, 1).same_action(&at(5, 2)));
        assert!(!at(0, 1).same_action(&at(0, 1)));
    }

    // ── NotebookId ─────────────────────────────────────────────────────

    #[test]
    fn test_notebook_id_from_path() {
        let id = NotebookId::from_path(std::path::Path::new("/work/analysis.ipynb")).unwrap();
        assert_eq!(id.as_str(), "analysis");
        assert!(NotebookId::from_path(std::path::Path::new("/")).is_none());
    }
}
