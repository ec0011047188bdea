use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub(crate) fn read_json_document<T: DeserializeOwned>(
    document_path: &Path,
) -> Result<Option<T>, String> {
    let raw_json = match std::fs::read_to_string(document_path) {
        Ok(content) => content,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
        Err(error) => {
            return Err(format!(
                "Failed to read document '{}': {error}",
                document_path.display()
            ));
        }
    };

    let document = serde_json::from_str::<T>(&raw_json).map_err(|error| {
        format!(
            "Failed to parse document '{}': {error}",
            document_path.display()
        )
    })?;

    Ok(Some(document))
}

/// Loads a document, falling back to its default shape when it is absent or unreadable.
pub(crate) fn load_json_document_or_default<T: DeserializeOwned + Default>(
    document_path: &Path,
) -> T {
    match read_json_document(document_path) {
        Ok(Some(document)) => document,
        Ok(None) => T::default(),
        Err(error) => {
            tracing::warn!(
                document_path = %document_path.display(),
                document_error = %error,
                "Using empty document in place of unreadable one"
            );
            T::default()
        }
    }
}

pub(crate) fn write_json_document<T: Serialize>(
    document_path: &Path,
    document: &T,
) -> Result<(), String> {
    if let Some(parent_directory) = document_path.parent() {
        if !parent_directory.as_os_str().is_empty() {
            std::fs::create_dir_all(parent_directory).map_err(|error| {
                format!(
                    "Failed to create document directory '{}': {error}",
                    parent_directory.display()
                )
            })?;
        }
    }

    let temp_path = temporary_document_path(document_path);
    let serialized = serde_json::to_string_pretty(document)
        .map_err(|error| format!("Failed to serialize document: {error}"))?;

    std::fs::write(&temp_path, serialized).map_err(|error| {
        format!(
            "Failed to write temporary document '{}': {error}",
            temp_path.display()
        )
    })?;

    if let Err(error) = std::fs::rename(&temp_path, document_path) {
        let cleanup_error = std::fs::remove_file(&temp_path).err();
        if let Some(cleanup_error) = cleanup_error {
            return Err(format!(
                "Failed to finalize document '{}': {error}; temporary cleanup failed '{}': {cleanup_error}",
                document_path.display(),
                temp_path.display()
            ));
        }

        return Err(format!(
            "Failed to finalize document '{}': {error}",
            document_path.display()
        ));
    }

    Ok(())
}

/// Writes a document and logs instead of failing; persistence errors never stop the tracker.
pub(crate) fn persist_json_document<T: Serialize>(document_path: &Path, document: &T) {
    if let Err(error) = write_json_document(document_path, document) {
        tracing::warn!(
            document_path = %document_path.display(),
            document_error = %error,
            "Failed to persist document"
        );
    }
}

fn temporary_document_path(document_path: &Path) -> PathBuf {
    let Some(file_name) = document_path.file_name().and_then(|value| value.to_str()) else {
        return document_path.with_extension("json.tmp");
    };

    document_path.with_file_name(format!("{file_name}.tmp"))
}

#[cfg(test)]
pub(crate) fn unique_temp_directory(label: &str) -> PathBuf {
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp_nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or(0);
    let process_id = std::process::id();
    std::env::temp_dir().join(format!(
        "raidwatch_{label}_test_{process_id}_{timestamp_nanos}"
    ))
}
