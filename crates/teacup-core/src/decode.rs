//! Raw input descriptors to typed [`Message`]s.
//!
//! A terminal driver reports input as a loosely-typed JSON mapping with a
//! `"type"` discriminant:
//!
//! | `type` | required | optional |
//! |---|---|---|
//! | `key` | `key_type` | `runes`, `alt`, `name` |
//! | `mouse` | `x`, `y`, `button`, `action` | `shift`, `alt`, `ctrl` |
//! | `resize` | `width`, `height` | |
//! | `paste` | `text` | |
//! | `focus` / `blur` | | |
//!
//! Unknown discriminants decode to no message.  A known discriminant with
//! missing or malformed fields is a [`DecodeError`].

use crate::message::{
    KeyMsg, KeyType, Message, MouseAction, MouseButton, MouseMsg, WindowSizeMsg,
};
use serde::Deserialize;

/// The loosely-typed event descriptor produced by a terminal driver.
pub type RawEvent = serde_json::Value;

/// A descriptor had a recognized discriminant but unusable fields.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The descriptor is not an object with a string `"type"` field.
    #[error("event descriptor has no string \"type\" field")]
    MissingDiscriminant,
    /// Required fields are missing or have the wrong shape.
    #[error("malformed {kind} event: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown key type {0}")]
    UnknownKeyType(i64),
    #[error("unknown mouse button {0}")]
    UnknownMouseButton(i64),
    #[error("unknown mouse action {0}")]
    UnknownMouseAction(i64),
    #[error("invalid unicode code point {0:#x}")]
    InvalidCodePoint(u32),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Descriptor {
    Key {
        key_type: i64,
        #[serde(default)]
        runes: Option<Vec<u32>>,
        #[serde(default)]
        alt: Option<bool>,
        #[serde(default)]
        name: Option<String>,
    },
    Mouse {
        x: u16,
        y: u16,
        button: i64,
        action: i64,
        #[serde(default)]
        shift: Option<bool>,
        #[serde(default)]
        alt: Option<bool>,
        #[serde(default)]
        ctrl: Option<bool>,
    },
    Resize {
        width: u16,
        height: u16,
    },
    Paste {
        text: String,
    },
    Focus,
    Blur,
    #[serde(other)]
    Unknown,
}

/// Decode a raw descriptor into a message.
///
/// Returns `Ok(None)` for an absent descriptor or an unrecognized
/// discriminant.
pub fn decode<U>(raw: Option<&RawEvent>) -> Result<Option<Message<U>>, DecodeError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let kind = raw
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or(DecodeError::MissingDiscriminant)?;

    let descriptor =
        Descriptor::deserialize(raw).map_err(|source| DecodeError::Malformed {
            kind: kind.to_string(),
            source,
        })?;

    let msg = match descriptor {
        Descriptor::Key {
            key_type,
            runes,
            alt,
            name,
        } => {
            let key_type =
                KeyType::from_code(key_type).ok_or(DecodeError::UnknownKeyType(key_type))?;
            let runes = runes
                .unwrap_or_default()
                .into_iter()
                .map(|cp| char::from_u32(cp).ok_or(DecodeError::InvalidCodePoint(cp)))
                .collect::<Result<Vec<_>, _>>()?;
            Message::Key(KeyMsg {
                key_type,
                runes,
                alt: alt.unwrap_or(false),
                name: name.filter(|n| !n.is_empty()),
            })
        }
        Descriptor::Mouse {
            x,
            y,
            button,
            action,
            shift,
            alt,
            ctrl,
        } => Message::Mouse(MouseMsg {
            x,
            y,
            button: MouseButton::from_code(button)
                .ok_or(DecodeError::UnknownMouseButton(button))?,
            action: MouseAction::from_code(action)
                .ok_or(DecodeError::UnknownMouseAction(action))?,
            shift: shift.unwrap_or(false),
            alt: alt.unwrap_or(false),
            ctrl: ctrl.unwrap_or(false),
        }),
        Descriptor::Resize { width, height } => {
            Message::WindowSize(WindowSizeMsg { width, height })
        }
        Descriptor::Paste { text } => Message::Paste(text),
        Descriptor::Focus => Message::Focus,
        Descriptor::Blur => Message::Blur,
        Descriptor::Unknown => return Ok(None),
    };
    Ok(Some(msg))
}
