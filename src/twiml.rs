//! Voice response rendering.
//!
//! Serializes an ordered list of call actions into TwiML, the XML dialect the
//! telephony provider expects back from every webhook. This is a plain
//! serializer: no state, no branching, and no responsibility beyond the XML
//! escaping the output format requires.

use std::fmt::Write;

#[derive(Debug, Clone, Default)]
pub struct VoiceResponse {
    actions: Vec<Action>,
}

#[derive(Debug, Clone)]
enum Action {
    Say {
        text: String,
    },
    Gather {
        num_digits: usize,
        action: String,
        timeout: u32,
        children: Vec<Action>,
    },
    Dial {
        number: String,
    },
    Record {
        action: String,
        max_length: u32,
    },
    Redirect {
        url: String,
    },
    Hangup,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Speak text to the caller. The text is passed to the provider verbatim,
    /// modulo XML escaping.
    pub fn say(mut self, text: &str) -> Self {
        self.actions.push(Action::Say {
            text: text.to_string(),
        });
        self
    }

    /// Collect a fixed number of digits, speaking `prompt` while waiting.
    /// The digits are posted to `action` as the `Digits` form field.
    pub fn gather(mut self, num_digits: usize, action: &str, timeout: u32, prompt: &str) -> Self {
        self.actions.push(Action::Gather {
            num_digits,
            action: action.to_string(),
            timeout,
            children: vec![Action::Say {
                text: prompt.to_string(),
            }],
        });
        self
    }

    /// Forward the call to an external number.
    pub fn dial(mut self, number: &str) -> Self {
        self.actions.push(Action::Dial {
            number: number.to_string(),
        });
        self
    }

    /// Record the caller, posting the recording location to `action`.
    /// Anything after this element only plays if no audio was recorded.
    pub fn record(mut self, action: &str, max_length: u32) -> Self {
        self.actions.push(Action::Record {
            action: action.to_string(),
            max_length,
        });
        self
    }

    pub fn redirect(mut self, url: &str) -> Self {
        self.actions.push(Action::Redirect {
            url: url.to_string(),
        });
        self
    }

    pub fn hangup(mut self) -> Self {
        self.actions.push(Action::Hangup);
        self
    }

    pub fn build(self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n");
        for action in &self.actions {
            render(&mut xml, action, 1);
        }
        xml.push_str("</Response>");
        xml
    }
}

fn render(xml: &mut String, action: &Action, indent: usize) {
    let pad = "  ".repeat(indent);
    match action {
        Action::Say { text } => {
            let _ = writeln!(xml, "{}<Say>{}</Say>", pad, escape(text));
        }
        Action::Gather {
            num_digits,
            action,
            timeout,
            children,
        } => {
            let _ = writeln!(
                xml,
                "{}<Gather numDigits=\"{}\" action=\"{}\" method=\"POST\" timeout=\"{}\">",
                pad,
                num_digits,
                escape(action),
                timeout
            );
            for child in children {
                render(xml, child, indent + 1);
            }
            let _ = writeln!(xml, "{}</Gather>", pad);
        }
        Action::Dial { number } => {
            let _ = writeln!(xml, "{}<Dial>{}</Dial>", pad, escape(number));
        }
        Action::Record { action, max_length } => {
            let _ = writeln!(
                xml,
                "{}<Record action=\"{}\" method=\"POST\" maxLength=\"{}\"/>",
                pad,
                escape(action),
                max_length
            );
        }
        Action::Redirect { url } => {
            let _ = writeln!(
                xml,
                "{}<Redirect method=\"POST\">{}</Redirect>",
                pad,
                escape(url)
            );
        }
        Action::Hangup => {
            let _ = writeln!(xml, "{}<Hangup/>", pad);
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_wraps_prompt() {
        let xml = VoiceResponse::new()
            .gather(3, "/handle_extension_selection", 5, "Press 1 for Sales.")
            .redirect("/incoming_call")
            .build();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>"));
        assert!(xml.contains(
            "<Gather numDigits=\"3\" action=\"/handle_extension_selection\" method=\"POST\" timeout=\"5\">"
        ));
        assert!(xml.contains("<Say>Press 1 for Sales.</Say>"));
        assert!(xml.contains("</Gather>"));
        assert!(xml.contains("<Redirect method=\"POST\">/incoming_call</Redirect>"));
        assert!(xml.ends_with("</Response>"));
    }

    #[test]
    fn test_dial_record_hangup() {
        let xml = VoiceResponse::new()
            .dial("+12345678901")
            .record("/handle_recording/103", 30)
            .hangup()
            .build();
        assert!(xml.contains("<Dial>+12345678901</Dial>"));
        assert!(xml.contains(
            "<Record action=\"/handle_recording/103\" method=\"POST\" maxLength=\"30\"/>"
        ));
        assert!(xml.contains("<Hangup/>"));
    }

    #[test]
    fn test_escapes_text_and_attributes() {
        let xml = VoiceResponse::new()
            .say("Dunn & Sons <Ltd>")
            .record("/r?a=1&b=2", 30)
            .build();
        assert!(xml.contains("<Say>Dunn &amp; Sons &lt;Ltd&gt;</Say>"));
        assert!(xml.contains("action=\"/r?a=1&amp;b=2\""));
    }
}
