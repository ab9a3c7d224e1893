use std::fs;
use std::path::Path;

use serde::Deserialize;
use skyline_engine::{InputAction, Intent, IntentSource};

type AutopilotResult<T> = Result<T, String>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AutopilotScript {
    steps: Vec<AutopilotStep>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AutopilotStep {
    at_frame: u64,
    #[serde(default)]
    press: Vec<String>,
    #[serde(default)]
    release: Vec<String>,
}

/// Replays a scripted list of intents keyed by frame number. Releases in a
/// step are delivered before its presses.
#[derive(Debug, Default)]
pub(crate) struct Autopilot {
    intents: Vec<(u64, Intent)>,
    cursor: usize,
}

impl Autopilot {
    pub(crate) fn load(path: &Path) -> AutopilotResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| format!("read autopilot {}: {err}", path.display()))?;
        Self::from_json_str(&raw)
    }

    pub(crate) fn from_json_str(raw: &str) -> AutopilotResult<Self> {
        let script = parse_script(raw)?;
        let mut intents = Vec::new();
        let mut previous_frame = 0;
        for (index, step) in script.steps.iter().enumerate() {
            if step.at_frame < previous_frame {
                return Err(validation_err(
                    &format!("steps[{index}].at_frame"),
                    format!("{} comes before frame {previous_frame}", step.at_frame),
                ));
            }
            previous_frame = step.at_frame;
            for (field, names, make) in [
                ("release", &step.release, Intent::Release as fn(InputAction) -> Intent),
                ("press", &step.press, Intent::Press as fn(InputAction) -> Intent),
            ] {
                for (name_index, name) in names.iter().enumerate() {
                    let action = InputAction::from_name(name).ok_or_else(|| {
                        validation_err(
                            &format!("steps[{index}].{field}[{name_index}]"),
                            format!("unknown action '{name}'"),
                        )
                    })?;
                    intents.push((step.at_frame, make(action)));
                }
            }
        }
        Ok(Self { intents, cursor: 0 })
    }

    pub(crate) fn len(&self) -> usize {
        self.intents.len()
    }
}

impl IntentSource for Autopilot {
    /// Returns every scripted intent up to and including `frame` that has not
    /// been delivered yet.
    fn poll_intents(&mut self, frame: u64) -> Vec<Intent> {
        let start = self.cursor;
        while self
            .intents
            .get(self.cursor)
            .is_some_and(|(at_frame, _)| *at_frame <= frame)
        {
            self.cursor += 1;
        }
        self.intents[start..self.cursor]
            .iter()
            .map(|(_, intent)| *intent)
            .collect()
    }
}

fn parse_script(raw: &str) -> AutopilotResult<AutopilotScript> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, AutopilotScript>(&mut deserializer) {
        Ok(script) => Ok(script),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse autopilot json: {source}"))
            } else {
                Err(format!("parse autopilot json at {path}: {source}"))
            }
        }
    }
}

fn validation_err(path: &str, message: impl Into<String>) -> String {
    format!("validation failed at {path}: {}", message.into())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    const SCRIPT: &str = r#"{
        "steps": [
            { "at_frame": 0, "press": ["move_right"] },
            { "at_frame": 30, "press": ["jump", "fire"] },
            { "at_frame": 31, "release": ["jump", "fire"] },
            { "at_frame": 90, "release": ["move_right"], "press": ["quit"] }
        ]
    }"#;

    #[test]
    fn delivers_intents_on_their_frames() {
        let mut autopilot = Autopilot::from_json_str(SCRIPT).expect("script");
        assert_eq!(autopilot.len(), 7);

        assert_eq!(
            autopilot.poll_intents(0),
            vec![Intent::Press(InputAction::MoveRight)]
        );
        assert!(autopilot.poll_intents(1).is_empty());
        assert_eq!(
            autopilot.poll_intents(30),
            vec![
                Intent::Press(InputAction::Jump),
                Intent::Press(InputAction::Fire)
            ]
        );
    }

    #[test]
    fn skipped_frames_still_deliver_in_order() {
        let mut autopilot = Autopilot::from_json_str(SCRIPT).expect("script");
        autopilot.poll_intents(0);

        let late = autopilot.poll_intents(100);
        assert_eq!(
            late,
            vec![
                Intent::Press(InputAction::Jump),
                Intent::Press(InputAction::Fire),
                Intent::Release(InputAction::Jump),
                Intent::Release(InputAction::Fire),
                Intent::Release(InputAction::MoveRight),
                Intent::Press(InputAction::Quit),
            ]
        );
        assert!(autopilot.poll_intents(200).is_empty());
    }

    #[test]
    fn unknown_action_reports_path() {
        let error = Autopilot::from_json_str(
            r#"{"steps":[{"at_frame":0,"press":["move_right","dance"]}]}"#,
        )
        .expect_err("must fail");
        assert_eq!(
            error,
            "validation failed at steps[0].press[1]: unknown action 'dance'"
        );
    }

    #[test]
    fn out_of_order_frames_are_rejected() {
        let error = Autopilot::from_json_str(
            r#"{"steps":[{"at_frame":10},{"at_frame":5}]}"#,
        )
        .expect_err("must fail");
        assert!(error.starts_with("validation failed at steps[1].at_frame"));
    }

    #[test]
    fn malformed_json_reports_field_path() {
        let error = Autopilot::from_json_str(r#"{"steps":[{"at_frame":"soon"}]}"#)
            .expect_err("must fail");
        assert!(error.starts_with("parse autopilot json at steps[0].at_frame"));
    }

    #[test]
    fn loads_from_file() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("autopilot.json");
        fs::write(&path, SCRIPT).expect("write");

        let autopilot = Autopilot::load(&path).expect("load");
        assert_eq!(autopilot.len(), 7);
        assert!(Autopilot::load(&temp.path().join("missing.json")).is_err());
    }
}
