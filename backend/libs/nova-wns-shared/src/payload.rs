//! XML payload rendering for templates and badges.

use std::fmt;
use std::str::FromStr;

use crate::errors::WnsError;
use crate::models::{json_list, NotificationType, ToastAudio, ToastOptions};
use crate::templates::{Template, TemplateParams};

pub const AUDIO_SOURCE_PREFIX: &str = "ms-winsoundevent:Notification.";

/// System sounds a toast may play
pub const AUDIO_SOURCES: [&str; 9] = [
    "Default",
    "IM",
    "Mail",
    "Reminder",
    "SMS",
    "Alarm",
    "Looping.Alarm2",
    "Looping.Call",
    "Looping.Call2",
];

/// Escape `&`, `<`, `>` and `"` for use in element text and attribute values
pub fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render a tile or toast template.
///
/// Toast options are only honoured for toast templates.
pub fn render_template(
    template: Template,
    params: &TemplateParams,
    toast: &ToastOptions,
) -> Result<String, WnsError> {
    let values = params.resolve(template)?;
    let kind = template.notification_type();
    let element = match kind {
        NotificationType::Tile => "tile",
        _ => "toast",
    };

    let (attributes, audio) = if kind == NotificationType::Toast {
        (toast_attributes(toast), audio_element(toast.audio.as_ref())?)
    } else {
        (String::new(), String::new())
    };

    let mut xml = format!(
        "<{}{}><visual><binding template=\"{}\">",
        element,
        attributes,
        template.name()
    );

    let (images, texts) = values.split_at(template.image_count() * 2);
    for (i, pair) in images.chunks(2).enumerate() {
        xml.push_str(&format!(
            "<image id=\"{}\" src=\"{}\" alt=\"{}\"/>",
            i + 1,
            xml_escape(&pair[0]),
            xml_escape(&pair[1])
        ));
    }
    for (i, text) in texts.iter().enumerate() {
        xml.push_str(&format!("<text id=\"{}\">{}</text>", i + 1, xml_escape(text)));
    }

    xml.push_str("</binding></visual>");
    xml.push_str(&audio);
    xml.push_str(&format!("</{}>", element));

    Ok(xml)
}

fn toast_attributes(toast: &ToastOptions) -> String {
    let mut attributes = String::new();
    if let Some(duration) = toast.duration {
        attributes.push_str(&format!(" duration=\"{}\"", duration.as_str()));
    }
    if let Some(launch) = toast.launch.as_deref().filter(|l| !l.is_empty()) {
        attributes.push_str(&format!(" launch=\"{}\"", xml_escape(launch)));
    }
    attributes
}

fn audio_element(audio: Option<&ToastAudio>) -> Result<String, WnsError> {
    let Some(audio) = audio else {
        return Ok(String::new());
    };

    let invalid_source = || {
        WnsError::validation(format!(
            "The options.audio.src must be a string value from the following set: {}",
            json_list(&AUDIO_SOURCES)
        ))
    };

    let src = match audio.src.as_deref() {
        Some(src) => {
            let bare = src.strip_prefix(AUDIO_SOURCE_PREFIX).unwrap_or(src);
            if !AUDIO_SOURCES.contains(&bare) {
                return Err(invalid_source());
            }
            Some(format!("{}{}", AUDIO_SOURCE_PREFIX, bare))
        }
        // A silent toast has to name the sound it silences.
        None if audio.silent => return Err(invalid_source()),
        None => None,
    };

    let mut element = String::from("<audio");
    if let Some(src) = src {
        element.push_str(&format!(" src=\"{}\"", src));
    }
    if audio.silent {
        element.push_str(" silent=\"true\"");
    }
    if audio.looping {
        element.push_str(" loop=\"true\"");
    }
    element.push_str("/>");

    Ok(element)
}

/// Glyph badge states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeState {
    None,
    Activity,
    Alert,
    Available,
    Away,
    Busy,
    NewMessage,
    Paused,
    Playing,
    Unavailable,
    Error,
}

impl BadgeState {
    pub const ALL: [BadgeState; 11] = [
        BadgeState::None,
        BadgeState::Activity,
        BadgeState::Alert,
        BadgeState::Available,
        BadgeState::Away,
        BadgeState::Busy,
        BadgeState::NewMessage,
        BadgeState::Paused,
        BadgeState::Playing,
        BadgeState::Unavailable,
        BadgeState::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeState::None => "none",
            BadgeState::Activity => "activity",
            BadgeState::Alert => "alert",
            BadgeState::Available => "available",
            BadgeState::Away => "away",
            BadgeState::Busy => "busy",
            BadgeState::NewMessage => "newMessage",
            BadgeState::Paused => "paused",
            BadgeState::Playing => "playing",
            BadgeState::Unavailable => "unavailable",
            BadgeState::Error => "error",
        }
    }
}

/// Badge content: a 1-99 count or a glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeValue {
    Count(u8),
    State(BadgeState),
}

impl BadgeValue {
    pub fn count(value: i64) -> Result<Self, WnsError> {
        if !(1..=99).contains(&value) {
            return Err(WnsError::validation(
                "The badge numeric value must be in the 1-99 range.",
            ));
        }
        Ok(BadgeValue::Count(value as u8))
    }

    fn validate(&self) -> Result<(), WnsError> {
        if let BadgeValue::Count(n) = self {
            BadgeValue::count(i64::from(*n))?;
        }
        Ok(())
    }
}

impl fmt::Display for BadgeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BadgeValue::Count(n) => write!(f, "{}", n),
            BadgeValue::State(state) => f.write_str(state.as_str()),
        }
    }
}

impl From<BadgeState> for BadgeValue {
    fn from(state: BadgeState) -> Self {
        BadgeValue::State(state)
    }
}

impl TryFrom<i64> for BadgeValue {
    type Error = WnsError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        BadgeValue::count(value)
    }
}

impl FromStr for BadgeValue {
    type Err = WnsError;

    /// Numeric strings are counts; anything else must name a badge state
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(n) = s.trim().parse::<i64>() {
            return BadgeValue::count(n);
        }
        BadgeState::ALL
            .iter()
            .find(|state| state.as_str() == s)
            .map(|state| BadgeValue::State(*state))
            .ok_or_else(|| {
                let states = BadgeState::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>();
                WnsError::validation(format!(
                    "The badge value must be either an integer in the 1-99 range or one of {}",
                    json_list(&states)
                ))
            })
    }
}

/// Badge notification: value plus optional schema version (default 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub value: BadgeValue,
    pub version: Option<u32>,
}

impl Badge {
    pub fn new(value: impl Into<BadgeValue>) -> Self {
        Self {
            value: value.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// `<badge value="…" version="…"/>`
    pub fn to_xml(&self) -> Result<String, WnsError> {
        self.value.validate()?;
        let version = self.version.unwrap_or(1);
        if version == 0 {
            return Err(WnsError::validation(
                "The badge version must be a positive integer.",
            ));
        }
        Ok(format!(
            "<badge value=\"{}\" version=\"{}\"/>",
            self.value, version
        ))
    }
}

impl From<BadgeValue> for Badge {
    fn from(value: BadgeValue) -> Self {
        Badge::new(value)
    }
}

impl From<BadgeState> for Badge {
    fn from(state: BadgeState) -> Self {
        Badge::new(state)
    }
}
