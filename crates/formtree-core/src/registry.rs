#![forbid(unsafe_code)]

//! Field type registry.
//!
//! Maps a field-type tag (`"text"`, `"select"`, `"fieldset"`, ...) to the
//! metadata a renderer needs: host element, input subtype, whether the field
//! is user-editable and whether it holds free text. The set of tags is closed;
//! [`lookup`] returns `None` for anything else and renderers fall back to a
//! label-only node.

use std::fmt;

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

/// Host element a field type renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Input,
    Textarea,
    Select,
    Div,
    Fieldset,
    Form,
    Button,
    Legend,
}

impl Element {
    /// Markup tag name.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Div => "div",
            Self::Fieldset => "fieldset",
            Self::Form => "form",
            Self::Button => "button",
            Self::Legend => "legend",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ---------------------------------------------------------------------------
// FieldInfo
// ---------------------------------------------------------------------------

/// Rendering metadata for one field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    /// Host element.
    pub element: Element,
    /// `type` attribute for `input`/`button` elements.
    pub subtype: Option<&'static str>,
    /// Whether users edit the value directly.
    pub editable: bool,
    /// Whether the value is free text (seeds the `value` attribute).
    pub text_based: bool,
}

impl FieldInfo {
    const fn text(element: Element, subtype: Option<&'static str>) -> Self {
        Self {
            element,
            subtype,
            editable: true,
            text_based: true,
        }
    }

    const fn editable(element: Element, subtype: Option<&'static str>) -> Self {
        Self {
            element,
            subtype,
            editable: true,
            text_based: false,
        }
    }

    const fn fixed(element: Element, subtype: Option<&'static str>) -> Self {
        Self {
            element,
            subtype,
            editable: false,
            text_based: false,
        }
    }
}

// ---------------------------------------------------------------------------
// FieldKind
// ---------------------------------------------------------------------------

/// Every supported field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    // Text-based
    Text,
    Date,
    DateTime,
    DateTimeLocal,
    Email,
    Month,
    Number,
    Password,
    Search,
    Tel,
    Textarea,
    Time,
    Url,
    Week,
    // Specialized editables
    Checkbox,
    Color,
    File,
    Range,
    Select,
    // Containers
    Checklist,
    Fieldset,
    Form,
    Radio,
    // Non-editables
    Button,
    Hidden,
    Image,
    Legend,
    Reset,
    Submit,
}

impl FieldKind {
    /// All kinds, in registry order.
    pub const ALL: [Self; 29] = [
        Self::Text,
        Self::Date,
        Self::DateTime,
        Self::DateTimeLocal,
        Self::Email,
        Self::Month,
        Self::Number,
        Self::Password,
        Self::Search,
        Self::Tel,
        Self::Textarea,
        Self::Time,
        Self::Url,
        Self::Week,
        Self::Checkbox,
        Self::Color,
        Self::File,
        Self::Range,
        Self::Select,
        Self::Checklist,
        Self::Fieldset,
        Self::Form,
        Self::Radio,
        Self::Button,
        Self::Hidden,
        Self::Image,
        Self::Legend,
        Self::Reset,
        Self::Submit,
    ];

    /// Resolve a type tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// The type tag as written in field specs.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::DateTimeLocal => "datetime-local",
            Self::Email => "email",
            Self::Month => "month",
            Self::Number => "number",
            Self::Password => "password",
            Self::Search => "search",
            Self::Tel => "tel",
            Self::Textarea => "textarea",
            Self::Time => "time",
            Self::Url => "url",
            Self::Week => "week",
            Self::Checkbox => "checkbox",
            Self::Color => "color",
            Self::File => "file",
            Self::Range => "range",
            Self::Select => "select",
            Self::Checklist => "checklist",
            Self::Fieldset => "fieldset",
            Self::Form => "form",
            Self::Radio => "radio",
            Self::Button => "button",
            Self::Hidden => "hidden",
            Self::Image => "image",
            Self::Legend => "legend",
            Self::Reset => "reset",
            Self::Submit => "submit",
        }
    }

    /// Rendering metadata.
    #[must_use]
    pub const fn info(self) -> FieldInfo {
        use Element::{Button, Div, Fieldset, Form, Input, Legend, Select, Textarea};
        match self {
            Self::Text => FieldInfo::text(Input, Some("text")),
            Self::Date => FieldInfo::text(Input, Some("date")),
            Self::DateTime => FieldInfo::text(Input, Some("datetime")),
            Self::DateTimeLocal => FieldInfo::text(Input, Some("datetime-local")),
            Self::Email => FieldInfo::text(Input, Some("email")),
            Self::Month => FieldInfo::text(Input, Some("month")),
            Self::Number => FieldInfo::text(Input, Some("number")),
            Self::Password => FieldInfo::text(Input, Some("password")),
            Self::Search => FieldInfo::text(Input, Some("search")),
            Self::Tel => FieldInfo::text(Input, Some("tel")),
            Self::Textarea => FieldInfo::text(Textarea, None),
            Self::Time => FieldInfo::text(Input, Some("time")),
            Self::Url => FieldInfo::text(Input, Some("url")),
            Self::Week => FieldInfo::text(Input, Some("week")),
            Self::Checkbox => FieldInfo::editable(Input, Some("checkbox")),
            Self::Color => FieldInfo::editable(Input, Some("color")),
            Self::File => FieldInfo::editable(Input, Some("file")),
            Self::Range => FieldInfo::editable(Input, Some("range")),
            Self::Select => FieldInfo::editable(Select, None),
            Self::Checklist => FieldInfo::fixed(Div, None),
            Self::Fieldset => FieldInfo::fixed(Fieldset, None),
            Self::Form => FieldInfo::fixed(Form, None),
            Self::Radio => FieldInfo::fixed(Div, None),
            Self::Button => FieldInfo::fixed(Button, Some("button")),
            Self::Hidden => FieldInfo::fixed(Input, Some("hidden")),
            Self::Image => FieldInfo::fixed(Input, Some("image")),
            Self::Legend => FieldInfo::fixed(Legend, None),
            Self::Reset => FieldInfo::fixed(Button, Some("reset")),
            Self::Submit => FieldInfo::fixed(Button, Some("submit")),
        }
    }

    /// Whether fields of this kind may carry children.
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(
            self,
            Self::Form | Self::Fieldset | Self::Radio | Self::Checklist
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Look up rendering metadata for a type tag.
#[must_use]
pub fn lookup(tag: &str) -> Option<FieldInfo> {
    FieldKind::from_tag(tag).map(FieldKind::info)
}
