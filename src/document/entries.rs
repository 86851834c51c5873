//! Form data set extraction.
//!
//! Walks a form's listed controls in tree order and produces the entries a
//! browser would submit, before the submitter is taken into account.

use rustc_hash::FxHashMap;
use scraper::{ElementRef, Html};

use crate::form::FileDescriptor;

use super::element::{
    ControlState, Element, control_value, form_owner, input_type, is_checked,
    selected_option_values,
};
use super::elements;

// ============================================================================
// FormEntry
// ============================================================================

/// One entry of a form data set.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEntry {
    /// A text control value.
    Text {
        /// Control name.
        name: String,
        /// Submitted value.
        value: String,
    },
    /// A file input and the files currently injected into it.
    File {
        /// Control name.
        name: String,
        /// Injected files; empty when none were set.
        files: Vec<FileDescriptor>,
    },
}

impl FormEntry {
    /// Creates a text entry.
    #[inline]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the entry name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

// ============================================================================
// Element - Entries
// ============================================================================

impl Element {
    /// Returns the form data set of this `<form>`, in tree order.
    ///
    /// Empty when the element is not a form.
    #[must_use]
    pub fn form_entries(&self) -> Vec<FormEntry> {
        let controls = self.document().controls().clone();
        self.with_ref(|html, form| {
            if form.value().name() == "form" {
                collect_entries(html, &form, &controls)
            } else {
                Vec::new()
            }
        })
        .unwrap_or_default()
    }

    /// Returns the entries this element adds when it is the submitter.
    ///
    /// Image buttons submit click coordinates; a nameless submitter
    /// contributes nothing. The value is the live one, so a value set with
    /// [`set_value`](Element::set_value) is what gets sent.
    #[must_use]
    pub fn submitter_entries(&self) -> Vec<FormEntry> {
        let state = self.state();
        self.with_ref(|_, el| {
            let element = el.value();
            let name = element.attr("name").unwrap_or_default();

            if element.name() == "input" && input_type(&el) == "image" {
                let prefix = if name.is_empty() {
                    String::new()
                } else {
                    format!("{name}.")
                };
                return vec![
                    FormEntry::text(format!("{prefix}x"), "0"),
                    FormEntry::text(format!("{prefix}y"), "0"),
                ];
            }

            if name.is_empty() {
                return Vec::new();
            }
            vec![FormEntry::text(name, control_value(&el, state.as_ref()))]
        })
        .unwrap_or_default()
    }
}

// ============================================================================
// Extraction
// ============================================================================

fn collect_entries(
    html: &Html,
    form: &ElementRef<'_>,
    controls: &FxHashMap<usize, ControlState>,
) -> Vec<FormEntry> {
    let mut entries = Vec::new();

    for (index, el) in elements(html).enumerate() {
        if form_owner(html, &el).map(|owner| owner.id()) != Some(form.id()) {
            continue;
        }

        let element = el.value();
        let Some(name) = element.attr("name").filter(|name| !name.is_empty()) else {
            continue;
        };
        if is_disabled(&el) || in_datalist(&el) {
            continue;
        }

        let state = controls.get(&index);
        match element.name() {
            "input" => match input_type(&el).as_str() {
                "submit" | "image" | "reset" | "button" => {}
                "checkbox" | "radio" => {
                    if is_checked(&el, state) {
                        entries.push(FormEntry::text(name, control_value(&el, state)));
                    }
                }
                "file" => entries.push(FormEntry::File {
                    name: name.to_string(),
                    files: state.map(|s| s.files.clone()).unwrap_or_default(),
                }),
                _ => entries.push(FormEntry::text(name, control_value(&el, state))),
            },
            "select" => {
                for value in selected_option_values(&el, state) {
                    entries.push(FormEntry::text(name, value));
                }
            }
            "textarea" => entries.push(FormEntry::text(name, control_value(&el, state))),
            _ => {}
        }
    }

    entries
}

/// Returns `true` when the control or an enclosing fieldset is disabled.
///
/// Controls inside the first `<legend>` of a disabled fieldset stay enabled.
fn is_disabled(el: &ElementRef<'_>) -> bool {
    if el.value().attr("disabled").is_some() {
        return true;
    }

    el.ancestors()
        .filter_map(ElementRef::wrap)
        .filter(|ancestor| {
            ancestor.value().name() == "fieldset" && ancestor.value().attr("disabled").is_some()
        })
        .any(|fieldset| {
            let legend = fieldset
                .children()
                .filter_map(ElementRef::wrap)
                .find(|child| child.value().name() == "legend");
            match legend {
                Some(legend) => !el.ancestors().any(|ancestor| ancestor.id() == legend.id()),
                None => true,
            }
        })
}

fn in_datalist(el: &ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().name() == "datalist")
}

// ============================================================================
// Tests
// ============================================================================
