//! Audio, power and session controls
//!
//! Each platform has its own front end for these; the command lines are built
//! separately from running them so they can be checked without side effects.

use super::{run_command, spawn_detached, SkillError, SkillGroup};
use crate::command::normalize::clamp_volume;
use crate::core::types::Target;
use serde_json::Value;

pub fn group() -> SkillGroup {
    SkillGroup::new("system")
        .with_unary("set_volume", set_volume)
        .with_nullary("mute_system", || run_mixer(MixerAction::Mute))
        .with_nullary("unmute_system", || run_mixer(MixerAction::Unmute))
        .with_nullary("shutdown", || run_session(SessionAction::Shutdown))
        .with_nullary("restart", || run_session(SessionAction::Restart))
        .with_nullary("sleep", || run_session(SessionAction::Sleep))
        .with_nullary("close_all_apps", || run_session(SessionAction::CloseAllApps))
        .with_nullary("open_task_manager", || run_session(SessionAction::OpenTaskManager))
        .with_nullary("play_pause_media", || run_session(SessionAction::PlayPauseMedia))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixerAction {
    SetVolume(u8),
    Mute,
    Unmute,
}

fn set_volume(target: Option<&Target>) -> Result<Value, SkillError> {
    let percent = match target.cloned().map(clamp_volume) {
        Some(Target::Integer(n)) => n as u8,
        Some(other) => {
            return Err(SkillError::Failed(format!(
                "'{}' is not a volume level",
                other
            )))
        }
        None => return Err(SkillError::MissingTarget),
    };
    run_mixer(MixerAction::SetVolume(percent))
}

fn run_mixer(action: MixerAction) -> Result<Value, SkillError> {
    let (program, args) = mixer_command(std::env::consts::OS, action)?;
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    run_command(program, &args)?;
    Ok(Value::Null)
}

/// Command line that performs `action` on `os`
pub fn mixer_command(
    os: &'static str,
    action: MixerAction,
) -> Result<(&'static str, Vec<String>), SkillError> {
    match os {
        "linux" => {
            let setting = match action {
                MixerAction::SetVolume(percent) => format!("{}%", percent),
                MixerAction::Mute => "mute".to_string(),
                MixerAction::Unmute => "unmute".to_string(),
            };
            Ok((
                "amixer",
                vec!["-q".into(), "set".into(), "Master".into(), setting],
            ))
        }
        "macos" => {
            let script = match action {
                MixerAction::SetVolume(percent) => format!("set volume output volume {}", percent),
                MixerAction::Mute => "set volume with output muted".to_string(),
                MixerAction::Unmute => "set volume without output muted".to_string(),
            };
            Ok(("osascript", vec!["-e".into(), script]))
        }
        "windows" => {
            // Media keys: 173 mute toggle, 174 down, 175 up; one step is ~2%
            let send = |key: u8, times: u32| {
                format!(
                    "$s = New-Object -ComObject WScript.Shell; for ($i = 0; $i -lt {}; $i++) {{ $s.SendKeys([char]{}) }}",
                    times, key
                )
            };
            let script = match action {
                MixerAction::SetVolume(percent) => {
                    format!("{}; {}", send(174, 50), send(175, u32::from(percent) / 2))
                }
                MixerAction::Mute | MixerAction::Unmute => send(173, 1),
            };
            Ok(("powershell", vec!["-Command".into(), script]))
        }
        other => Err(SkillError::Unsupported(other)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Shutdown,
    Restart,
    Sleep,
    CloseAllApps,
    OpenTaskManager,
    PlayPauseMedia,
}

impl SessionAction {
    /// Starts a program that keeps running, so it must not be waited on
    fn detaches(self) -> bool {
        matches!(self, SessionAction::OpenTaskManager)
    }
}

fn run_session(action: SessionAction) -> Result<Value, SkillError> {
    let (program, args) = session_command(std::env::consts::OS, action)?;
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    tracing::info!("System action {:?}", action);
    if action.detaches() {
        spawn_detached(program, &args)?;
    } else {
        run_command(program, &args)?;
    }
    Ok(Value::Null)
}

/// Command line that performs `action` on `os`
pub fn session_command(
    os: &'static str,
    action: SessionAction,
) -> Result<(&'static str, Vec<String>), SkillError> {
    let args = |parts: &[&str]| parts.iter().map(|p| p.to_string()).collect::<Vec<_>>();

    match os {
        "linux" => Ok(match action {
            SessionAction::Shutdown => ("shutdown", args(&["-h", "+0"])),
            SessionAction::Restart => ("shutdown", args(&["-r", "+0"])),
            SessionAction::Sleep => ("systemctl", args(&["suspend"])),
            SessionAction::CloseAllApps => (
                "sh",
                args(&["-c", "wmctrl -l | awk '{print $1}' | xargs -r -n1 wmctrl -ic"]),
            ),
            SessionAction::OpenTaskManager => ("gnome-system-monitor", Vec::new()),
            SessionAction::PlayPauseMedia => ("playerctl", args(&["play-pause"])),
        }),
        "macos" => {
            let script = match action {
                SessionAction::Shutdown => "tell application \"System Events\" to shut down",
                SessionAction::Restart => "tell application \"System Events\" to restart",
                SessionAction::Sleep => "tell application \"System Events\" to sleep",
                SessionAction::CloseAllApps => {
                    "tell application \"System Events\" to set visibleApps to name of every application process whose background only is false and name is not \"Finder\"\nrepeat with appName in visibleApps\ntell application appName to quit\nend repeat"
                }
                SessionAction::OpenTaskManager => {
                    return Ok(("open", args(&["-a", "Activity Monitor"])))
                }
                SessionAction::PlayPauseMedia => "tell application \"Music\" to playpause",
            };
            Ok(("osascript", args(&["-e", script])))
        }
        "windows" => Ok(match action {
            SessionAction::Shutdown => ("shutdown", args(&["/s", "/t", "5"])),
            SessionAction::Restart => ("shutdown", args(&["/r", "/t", "5"])),
            SessionAction::Sleep => (
                "rundll32.exe",
                args(&["powrprof.dll,SetSuspendState", "0,1,0"]),
            ),
            SessionAction::CloseAllApps => (
                "powershell",
                args(&[
                    "-Command",
                    "Get-Process | Where-Object {$_.MainWindowTitle -ne ''} | ForEach-Object {Stop-Process $_.Id -Force}",
                ]),
            ),
            SessionAction::OpenTaskManager => ("taskmgr", Vec::new()),
            // Media key 179 toggles play/pause
            SessionAction::PlayPauseMedia => (
                "powershell",
                args(&["-Command", "(New-Object -ComObject WScript.Shell).SendKeys([char]179)"]),
            ),
        }),
        other => Err(SkillError::Unsupported(other)),
    }
}
