//! Input scripts for headless runs.
//!
//! One event per line, `<tick> <action> [args]`:
//!
//! ```text
//! # walk forward for a second, then stop
//! 1   press KeyW
//! 61  release KeyW
//! 30  resize secondary 320x240
//! 90  release_all
//! ```
//!
//! Events for a tick are applied, in file order, just before that tick runs.

use anyhow::{Context, Result, bail};
use mirrorworld_common::{SurfaceSize, ViewRole};
use mirrorworld_input::Key;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Press(Key),
    Release(Key),
    ReleaseAll,
    Resize(ViewRole, SurfaceSize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEvent {
    pub tick: u64,
    pub action: Action,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    events: Vec<ScriptEvent>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in script {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut events = Vec::new();
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let event = parse_line(line).with_context(|| format!("line {}: `{line}`", n + 1))?;
            events.push(event);
        }
        // Stable: same-tick events keep file order.
        events.sort_by_key(|e| e.tick);
        Ok(Self { events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events scheduled for `tick`.
    pub fn at(&self, tick: u64) -> impl Iterator<Item = &ScriptEvent> {
        self.events.iter().filter(move |e| e.tick == tick)
    }
}

fn parse_line(line: &str) -> Result<ScriptEvent> {
    let mut words = line.split_whitespace();
    let tick = words
        .next()
        .context("missing tick")?
        .parse::<u64>()
        .context("tick must be a whole number")?;
    let action = match words.next().context("missing action")? {
        "press" => Action::Press(Key::new(words.next().context("press needs a key")?)),
        "release" => Action::Release(Key::new(words.next().context("release needs a key")?)),
        "release_all" => Action::ReleaseAll,
        "resize" => {
            let role = parse_role(words.next().context("resize needs a view")?)?;
            let size = parse_size(words.next().context("resize needs WxH")?)?;
            Action::Resize(role, size)
        }
        other => bail!("unknown action `{other}`"),
    };
    if let Some(extra) = words.next() {
        bail!("unexpected `{extra}`");
    }
    Ok(ScriptEvent { tick, action })
}

fn parse_role(word: &str) -> Result<ViewRole> {
    match word {
        "primary" => Ok(ViewRole::Primary),
        "secondary" => Ok(ViewRole::Secondary),
        other => bail!("unknown view `{other}` (primary or secondary)"),
    }
}

pub fn parse_size(word: &str) -> Result<SurfaceSize> {
    let (w, h) = word.split_once('x').context("size must look like 640x480")?;
    Ok(SurfaceSize::new(
        w.parse::<u32>().context("bad width")?,
        h.parse::<u32>().context("bad height")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_actions() {
        let script = Script::parse(
            "# comment\n\n1 press KeyW\n5 release KeyW\n3 resize secondary 320x240\n9 release_all\n",
        )
        .unwrap();
        assert_eq!(script.len(), 4);
        let at3: Vec<_> = script.at(3).collect();
        assert_eq!(
            at3[0].action,
            Action::Resize(ViewRole::Secondary, SurfaceSize::new(320, 240))
        );
        assert_eq!(script.at(1).next().unwrap().action, Action::Press(Key::new("KeyW")));
        assert_eq!(script.at(9).next().unwrap().action, Action::ReleaseAll);
        assert_eq!(script.at(2).count(), 0);
    }

    #[test]
    fn same_tick_keeps_file_order() {
        let script = Script::parse("2 press KeyA\n1 press KeyW\n2 release KeyA\n").unwrap();
        let actions: Vec<_> = script.at(2).map(|e| e.action.clone()).collect();
        assert_eq!(
            actions,
            vec![Action::Press(Key::new("KeyA")), Action::Release(Key::new("KeyA"))]
        );
    }

    #[test]
    fn errors_name_the_line() {
        let err = Script::parse("1 press KeyW\nx press KeyS\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
        assert!(Script::parse("1 jump").is_err());
        assert!(Script::parse("1 press").is_err());
        assert!(Script::parse("1 resize tertiary 1x1").is_err());
        assert!(Script::parse("1 release_all now").is_err());
    }

    #[test]
    fn sizes() {
        assert_eq!(parse_size("800x600").unwrap(), SurfaceSize::new(800, 600));
        assert!(parse_size("800").is_err());
        assert!(parse_size("ax600").is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("walk.script");
        std::fs::write(&path, "1 press KeyD\n").unwrap();
        assert_eq!(Script::load(&path).unwrap().len(), 1);
        assert!(Script::load(&dir.path().join("missing")).is_err());
    }
}
