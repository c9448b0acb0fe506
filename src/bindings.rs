//! TypeScript bindings for the types the settings panel exchanges with the
//! reader.

use crate::{config, error, library, progress, settings};
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn export_single_type<T: TS + 'static>(out_dir: &Path) -> Result<(), String> {
    T::export_all_to(out_dir).map_err(|err| err.to_string())
}

pub fn export_ts_bindings(out_dir: &Path) -> Result<(), String> {
    fs::create_dir_all(out_dir)
        .map_err(|err| format!("Failed to create {}: {err}", out_dir.display()))?;

    for entry in fs::read_dir(out_dir)
        .map_err(|err| format!("Failed to list {}: {err}", out_dir.display()))?
    {
        let entry = entry.map_err(|err| format!("Failed to read entry: {err}"))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("ts") {
            fs::remove_file(&path)
                .map_err(|err| format!("Failed to remove {}: {err}", path.display()))?;
        }
    }

    export_single_type::<progress::ProgressRecord>(out_dir)?;
    export_single_type::<library::LibraryEntry>(out_dir)?;
    export_single_type::<settings::SettingsMessage>(out_dir)?;
    export_single_type::<settings::SettingsReply>(out_dir)?;
    export_single_type::<settings::SettingsSnapshot>(out_dir)?;
    export_single_type::<error::ErrorReply>(out_dir)?;
    export_single_type::<config::LogLevel>(out_dir)?;

    let index_content = r#"export type { ProgressRecord } from "./ProgressRecord";
export type { LibraryEntry } from "./LibraryEntry";
export type { SettingsMessage } from "./SettingsMessage";
export type { SettingsReply } from "./SettingsReply";
export type { SettingsSnapshot } from "./SettingsSnapshot";
export type { ErrorReply } from "./ErrorReply";
export type { LogLevel } from "./LogLevel";
"#;

    fs::write(out_dir.join("index.ts"), index_content).map_err(|err| {
        format!(
            "Failed to write {}: {}",
            out_dir.join("index.ts").display(),
            err
        )
    })?;

    Ok(())
}
