//! Element handles and classification.
//!
//! An [`Element`] is a cheap handle (document + tree position). Reads go
//! to the parsed tree; writes (`set_value`, `set_checked`, injected files)
//! go to the document's control state, the way a live DOM keeps form
//! state apart from attributes.
//!
//! # Example
//!
//! ```ignore
//! let input = driver.query("[data-test-id=\"input2\"]")?.expect("input exists");
//! input.set_value("Input 2 value set from test");
//!
//! assert_eq!(input.kind(), ElementKind::FormField);
//! assert_eq!(input.form().unwrap().tag_name(), "form");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use scraper::{ElementRef, Html};
use tracing::{debug, warn};
use url::Url;

use crate::form::FileDescriptor;

use super::{Document, base_url_of, element_at, elements, index_of};

// ============================================================================
// ControlState
// ============================================================================

/// Live state of a form control, layered over its attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ControlState {
    /// Current value (`value` property); `None` falls back to markup.
    pub value: Option<String>,
    /// Current checkedness; `None` falls back to the `checked` attribute.
    pub checked: Option<bool>,
    /// Files injected into a file input.
    pub files: Vec<FileDescriptor>,
}

// ============================================================================
// ElementKind
// ============================================================================

/// What an element can be used for, classified from its tag and type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// `<form>`.
    Form,
    /// Any `<button>`, `<input type="submit">` or `<input type="image">`.
    SubmitControl,
    /// `<input type="file">`.
    FileInput,
    /// Any other form-associated control.
    FormField,
    /// `<a>` or `<area>`.
    Link,
    /// Anything else.
    Other,
}

impl ElementKind {
    /// Classifies a parsed element.
    pub(crate) fn classify(el: &ElementRef<'_>) -> Self {
        match el.value().name() {
            "form" => Self::Form,
            "button" => Self::SubmitControl,
            "input" => match input_type(el).as_str() {
                "submit" | "image" => Self::SubmitControl,
                "file" => Self::FileInput,
                _ => Self::FormField,
            },
            "select" | "textarea" | "fieldset" | "output" | "object" => Self::FormField,
            "a" | "area" => Self::Link,
            _ => Self::Other,
        }
    }

    /// Returns `true` for kinds that can have a form owner.
    #[inline]
    #[must_use]
    pub fn is_form_associated(&self) -> bool {
        matches!(self, Self::SubmitControl | Self::FileInput | Self::FormField)
    }
}

// ============================================================================
// Element
// ============================================================================

/// A handle to an element of a [`Document`].
///
/// Handles stay valid after the driver navigates away; they keep
/// referring to the document they were resolved from.
#[derive(Clone)]
pub struct Element {
    /// Owning document.
    document: Arc<Document>,
    /// Position in document order.
    index: usize,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag_name())
            .field("index", &self.index)
            .field("document", &self.document.url().as_str())
            .finish()
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.document, &other.document) && self.index == other.index
    }
}

impl Eq for Element {}

// ============================================================================
// Element - Constructor
// ============================================================================

impl Element {
    /// Creates a new element handle.
    pub(crate) fn new(document: Arc<Document>, index: usize) -> Self {
        Self { document, index }
    }
}

// ============================================================================
// Element - Accessors
// ============================================================================

impl Element {
    /// Returns the document this element belongs to.
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    /// Returns the lowercase tag name.
    #[must_use]
    pub fn tag_name(&self) -> String {
        self.with_ref(|_, el| el.value().name().to_string())
            .unwrap_or_default()
    }

    /// Gets an attribute value.
    ///
    /// Returns `None` if the attribute doesn't exist.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<String> {
        self.with_ref(|_, el| el.value().attr(name).map(str::to_string))
            .flatten()
    }

    /// Returns `true` if the attribute is present (with any value).
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.with_ref(|_, el| el.value().attr(name).is_some())
            .unwrap_or(false)
    }

    /// Returns the `id` attribute.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.attr("id")
    }

    /// Returns the `name` attribute.
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.attr("name")
    }

    /// Returns the normalized `type` of an `<input>`; `None` for other tags.
    #[must_use]
    pub fn input_type(&self) -> Option<String> {
        self.with_ref(|_, el| (el.value().name() == "input").then(|| input_type(&el)))
            .flatten()
    }

    /// Returns the element's text content.
    #[must_use]
    pub fn text_content(&self) -> String {
        self.with_ref(|_, el| el.text().collect::<String>())
            .unwrap_or_default()
    }

    /// Returns the element's inner HTML.
    #[must_use]
    pub fn inner_html(&self) -> String {
        self.with_ref(|_, el| el.inner_html()).unwrap_or_default()
    }

    /// Returns what this element can be used for.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.with_ref(|_, el| ElementKind::classify(&el))
            .unwrap_or(ElementKind::Other)
    }

    /// Returns the absolute link target of an `<a>` or `<area>`.
    ///
    /// `None` when the element is not a link or its `href` is missing,
    /// empty, or unresolvable.
    #[must_use]
    pub fn href(&self) -> Option<Url> {
        self.with_ref(|html, el| {
            if !matches!(el.value().name(), "a" | "area") {
                return None;
            }
            let href = el.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }
            base_url_of(html, self.document.url()).join(href).ok()
        })
        .flatten()
    }

    /// Returns the form owner: the form named by the `form` attribute, or
    /// the nearest ancestor form.
    #[must_use]
    pub fn form(&self) -> Option<Element> {
        self.with_ref(|html, el| form_owner(html, &el).and_then(|form| index_of(html, &form)))
            .flatten()
            .map(|index| Element::new(Arc::clone(&self.document), index))
    }
}

// ============================================================================
// Element - Control State
// ============================================================================

impl Element {
    /// Returns the current value, as the DOM `value` property would.
    ///
    /// For `<select>` this is the first selected option's value.
    #[must_use]
    pub fn value(&self) -> String {
        let state = self.state();
        self.with_ref(|_, el| control_value(&el, state.as_ref()))
            .unwrap_or_default()
    }

    /// Returns the values of every selected option of a `<select>`.
    ///
    /// Empty for other elements.
    #[must_use]
    pub fn select_value(&self) -> Vec<String> {
        let state = self.state();
        self.with_ref(|_, el| {
            if el.value().name() == "select" {
                selected_option_values(&el, state.as_ref())
            } else {
                Vec::new()
            }
        })
        .unwrap_or_default()
    }

    /// Sets the current value.
    ///
    /// On a `<select>` this selects the first option with that value. File
    /// inputs only accept the empty string, which clears injected files.
    pub fn set_value(&self, value: impl Into<String>) {
        let value = value.into();

        if self.kind() == ElementKind::FileInput {
            if value.is_empty() {
                self.document.controls().entry(self.index).or_default().files.clear();
            } else {
                warn!(index = self.index, "File inputs only accept an empty value; use Driver::set_files");
            }
            return;
        }

        debug!(index = self.index, value_len = value.len(), "Setting element value");
        self.document.controls().entry(self.index).or_default().value = Some(value);
    }

    /// Returns the checkedness of a checkbox or radio button.
    #[must_use]
    pub fn is_checked(&self) -> bool {
        let state = self.state();
        self.with_ref(|_, el| is_checked(&el, state.as_ref()))
            .unwrap_or(false)
    }

    /// Sets the checkedness of a checkbox or radio button.
    ///
    /// Checking a radio button unchecks the rest of its group.
    pub fn set_checked(&self, checked: bool) {
        let group = if checked && self.input_type().as_deref() == Some("radio") {
            self.with_ref(|html, el| radio_group(html, &el)).unwrap_or_default()
        } else {
            Vec::new()
        };

        let mut controls = self.document.controls();
        for other in group {
            controls.entry(other).or_default().checked = Some(false);
        }
        controls.entry(self.index).or_default().checked = Some(checked);
    }

    /// Returns the files injected into this file input.
    #[must_use]
    pub fn files(&self) -> Vec<FileDescriptor> {
        self.state().map(|state| state.files).unwrap_or_default()
    }

    /// Replaces the injected files of this file input.
    pub(crate) fn inject_files(&self, files: Vec<FileDescriptor>) {
        debug!(index = self.index, count = files.len(), "Injecting files");
        self.document.controls().entry(self.index).or_default().files = files;
    }
}

// ============================================================================
// Element - Internal
// ============================================================================

impl Element {
    /// Returns a snapshot of this element's control state.
    pub(super) fn state(&self) -> Option<ControlState> {
        self.document.controls().get(&self.index).cloned()
    }

    /// Runs `f` against the parsed element.
    ///
    /// `None` when the markup was replaced and the position is gone.
    pub(crate) fn with_ref<R>(
        &self,
        f: impl for<'h> FnOnce(&'h Html, ElementRef<'h>) -> R,
    ) -> Option<R> {
        self.document
            .with_html(|html| element_at(html, self.index).map(|el| f(html, el)))
    }
}

// ============================================================================
// Control Helpers
// ============================================================================

/// Returns `true` for listed, form-associated tags.
fn is_listed(tag: &str) -> bool {
    matches!(
        tag,
        "button" | "fieldset" | "input" | "object" | "output" | "select" | "textarea"
    )
}

/// Returns the lowercase `type` of an input, defaulting to `text`.
pub(super) fn input_type(el: &ElementRef<'_>) -> String {
    el.value()
        .attr("type")
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "text".to_string())
}

/// Resolves the form owner of a listed element.
pub(super) fn form_owner<'a>(html: &'a Html, el: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    if !is_listed(el.value().name()) {
        return None;
    }

    if let Some(form_id) = el.value().attr("form") {
        return elements(html)
            .find(|candidate| candidate.value().name() == "form" && candidate.value().id() == Some(form_id));
    }

    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "form")
}

/// Returns the value an option submits: its `value`, else its collapsed text.
pub(super) fn option_value(option: &ElementRef<'_>) -> String {
    match option.value().attr("value") {
        Some(value) => value.to_string(),
        None => option
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Returns the values of the selected options of a `<select>`.
pub(super) fn selected_option_values(
    select: &ElementRef<'_>,
    state: Option<&ControlState>,
) -> Vec<String> {
    let options: Vec<ElementRef<'_>> = select
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "option")
        .collect();

    if let Some(chosen) = state.and_then(|s| s.value.as_deref()) {
        return options
            .iter()
            .map(option_value)
            .filter(|value| value == chosen)
            .take(1)
            .collect();
    }

    let selected: Vec<String> = options
        .iter()
        .filter(|option| option.value().attr("selected").is_some())
        .map(option_value)
        .collect();

    if select.value().attr("multiple").is_some() {
        return selected;
    }

    // Single-select: the last explicitly selected option wins, else the
    // first enabled one.
    if let Some(last) = selected.into_iter().last() {
        return vec![last];
    }

    options
        .iter()
        .find(|option| option.value().attr("disabled").is_none())
        .map(option_value)
        .into_iter()
        .collect()
}

/// Returns the current value of a control.
pub(super) fn control_value(el: &ElementRef<'_>, state: Option<&ControlState>) -> String {
    let element = el.value();
    let overridden = state.and_then(|s| s.value.clone());

    match element.name() {
        "input" => {
            let kind = input_type(el);
            if kind == "file" {
                return state
                    .and_then(|s| s.files.first())
                    .map(|file| file.filename.clone())
                    .unwrap_or_default();
            }
            if let Some(value) = overridden {
                return value;
            }
            match element.attr("value") {
                Some(value) => value.to_string(),
                None if kind == "checkbox" || kind == "radio" => "on".to_string(),
                None => String::new(),
            }
        }
        "textarea" => overridden.unwrap_or_else(|| el.text().collect()),
        "select" => selected_option_values(el, state)
            .into_iter()
            .next()
            .unwrap_or_default(),
        "option" => option_value(el),
        _ => overridden.unwrap_or_else(|| element.attr("value").unwrap_or_default().to_string()),
    }
}

/// Returns the checkedness of a checkbox or radio button.
pub(super) fn is_checked(el: &ElementRef<'_>, state: Option<&ControlState>) -> bool {
    state
        .and_then(|s| s.checked)
        .unwrap_or_else(|| el.value().attr("checked").is_some())
}

/// Returns the positions of the other radio buttons in `el`'s group.
fn radio_group(html: &Html, el: &ElementRef<'_>) -> Vec<usize> {
    let Some(name) = el.value().attr("name").filter(|name| !name.is_empty()) else {
        return Vec::new();
    };
    let owner = form_owner(html, el).map(|form| form.id());

    elements(html)
        .enumerate()
        .filter(|(_, candidate)| {
            candidate.id() != el.id()
                && candidate.value().name() == "input"
                && input_type(candidate) == "radio"
                && candidate.value().attr("name") == Some(name)
                && form_owner(html, candidate).map(|form| form.id()) == owner
        })
        .map(|(index, _)| index)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
