//! Messages exchanged with the host.
//!
//! Both directions are JSON objects discriminated by a `name` field.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::feature::ModelData;
use crate::painter::PainterCommand;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum Inbound {
    /// Replaces the whole feature set; acknowledged with `ack`.
    Init { models: Vec<ModelData>, ack: String },
    /// Replaces the listed features by id; acknowledged with `ack`.
    Update { models: Vec<ModelData>, ack: String },
    /// `extent` is `[min_x, min_y, max_x, max_y]` in map units, `transform`
    /// a flat `[a, b, c, d, e, f]` matrix.
    RenderFrame {
        extent: [f64; 4],
        transform: [f64; 6],
        id: String,
    },
    CancelFrame { id: String },
}

impl Inbound {
    /// Decodes one host message.
    pub fn from_json(s: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(s)?)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum Outbound {
    Ack { id: String },
    /// One batch of a frame. A frame may span several of these.
    Frame {
        id: String,
        instructions: Vec<PainterCommand>,
    },
}

impl Outbound {
    /// Encodes the message for the host.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Ack id or frame id the message refers to.
    pub fn id(&self) -> &str {
        match self {
            Outbound::Ack { id } | Outbound::Frame { id, .. } => id,
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_frame_message() {
        let msg = Inbound::from_json(
            r#"{"name":"renderFrame","extent":[0,0,10,10],"transform":[1,0,0,-1,0,10],"id":"f1"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            Inbound::RenderFrame {
                extent: [0.0, 0.0, 10.0, 10.0],
                transform: [1.0, 0.0, 0.0, -1.0, 0.0, 10.0],
                id: "f1".into(),
            }
        );
    }

    #[test]
    fn init_carries_models() {
        let msg = Inbound::from_json(
            &json!({
                "name": "init",
                "ack": "a1",
                "models": [{
                    "id": "m",
                    "geometry": { "type": "Point", "coordinates": [0, 0] },
                    "properties": {}
                }]
            })
            .to_string(),
        )
        .unwrap();
        let Inbound::Init { models, ack } = msg else {
            panic!("expected init");
        };
        assert_eq!(ack, "a1");
        assert_eq!(models[0].id, "m");
    }

    #[test]
    fn unknown_message_is_an_error() {
        assert!(matches!(
            Inbound::from_json(r#"{"name":"explode"}"#),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn frame_response_shape() {
        let out = Outbound::Frame {
            id: "f".into(),
            instructions: vec![PainterCommand::Save],
        };
        let v: serde_json::Value = serde_json::from_str(&out.to_json().unwrap()).unwrap();
        assert_eq!(
            v,
            json!({ "name": "frame", "id": "f", "instructions": [{ "type": "save" }] })
        );
        assert_eq!(out.id(), "f");
    }
}
