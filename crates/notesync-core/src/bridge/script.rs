//! AppleScript templates for Notes.app
//!
//! Every builder returns a complete script for `osascript -e`. Scripts answer
//! on stdout with a short status word (`true`, `success`, `exists`, ...) or
//! `error: <message>`. Lists are joined with [`LIST_SEPARATOR`].

use super::NoteInfo;

/// Separator used when a script returns a list
pub const LIST_SEPARATOR: &str = "|||";

/// Prefix of a failure reported by the script itself
pub const ERROR_PREFIX: &str = "error:";

/// Escape a string for use inside an AppleScript string literal.
///
/// Newlines are kept as they are so note bodies keep their line structure.
pub fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn open_folders(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|segment| format!("tell folder \"{}\"\n", escape(segment)))
        .collect()
}

fn close_folders(segments: &[&str]) -> String {
    "end tell\n".repeat(segments.len())
}

/// Run `body` inside the account and the nested folder, mapping any
/// AppleScript error onto `on_error`.
fn in_folder(account: &str, segments: &[&str], body: &str, on_error: &str) -> String {
    format!(
        "tell application \"Notes\"\n\
         try\n\
         tell account \"{account}\"\n\
         {open}{body}\n\
         {close}end tell\n\
         on error errMsg\n\
         {on_error}\n\
         end try\n\
         end tell",
        account = escape(account),
        open = open_folders(segments),
        body = body,
        close = close_folders(segments),
        on_error = on_error,
    )
}

const RETURN_ERROR: &str = "return \"error: \" & errMsg";

/// `true` if a note with the title exists in the folder, else `false`
pub fn note_exists(account: &str, segments: &[&str], title: &str) -> String {
    let body = format!(
        "set targetNote to first note whose name is \"{}\"\nreturn \"true\"",
        escape(title)
    );
    in_folder(account, segments, &body, "return \"false\"")
}

/// Create a note with the given name and body
pub fn create_note(account: &str, segments: &[&str], title: &str, content: &str) -> String {
    let body = format!(
        "make new note with properties {{name:\"{}\", body:\"{}\"}}\nreturn \"success\"",
        escape(title),
        escape(content)
    );
    in_folder(account, segments, &body, RETURN_ERROR)
}

/// Replace the body of the first note with the given name
pub fn update_note(account: &str, segments: &[&str], title: &str, content: &str) -> String {
    let body = format!(
        "set targetNote to first note whose name is \"{}\"\n\
         set body of targetNote to \"{}\"\n\
         return \"success\"",
        escape(title),
        escape(content)
    );
    in_folder(account, segments, &body, RETURN_ERROR)
}

/// Delete the first note with the given name
pub fn delete_note(account: &str, segments: &[&str], title: &str) -> String {
    let body = format!(
        "set targetNote to first note whose name is \"{}\"\n\
         delete targetNote\n\
         return \"success\"",
        escape(title)
    );
    in_folder(account, segments, &body, RETURN_ERROR)
}

fn join_list(collect: &str) -> String {
    format!(
        "set itemList to {{}}\n\
         {collect}\n\
         set AppleScript's text item delimiters to \"{sep}\"\n\
         set itemString to itemList as string\n\
         set AppleScript's text item delimiters to \"\"\n\
         return itemString",
        collect = collect,
        sep = LIST_SEPARATOR,
    )
}

/// Names of the account's folders, joined with [`LIST_SEPARATOR`]
pub fn list_folders(account: &str) -> String {
    let body = join_list(
        "repeat with thisFolder in folders\n\
         set end of itemList to (name of thisFolder)\n\
         end repeat",
    );
    in_folder(account, &[], &body, RETURN_ERROR)
}

/// Titles of the notes in a folder; a missing folder yields an empty list
pub fn list_notes(account: &str, segments: &[&str]) -> String {
    let body = join_list(
        "repeat with thisNote in notes\n\
         set end of itemList to (name of thisNote)\n\
         end repeat",
    );
    in_folder(account, segments, &body, "return \"\"")
}

/// `exists` if the nested folder exists, else `not_exists`
pub fn folder_exists(account: &str, segments: &[&str]) -> String {
    let Some((last, parents)) = segments.split_last() else {
        return in_folder(account, &[], "return \"exists\"", "return \"not_exists\"");
    };
    let body = format!(
        "set targetFolder to folder \"{}\"\nreturn \"exists\"",
        escape(last)
    );
    in_folder(account, parents, &body, "return \"not_exists\"")
}

/// Create one folder named `name` inside the nested `parents`
pub fn make_folder(account: &str, parents: &[&str], name: &str) -> String {
    let body = format!(
        "make new folder with properties {{name:\"{}\"}}\nreturn \"success\"",
        escape(name)
    );
    in_folder(account, parents, &body, RETURN_ERROR)
}

/// Creation date, modification date and body joined with [`LIST_SEPARATOR`]
pub fn note_info(account: &str, segments: &[&str], title: &str) -> String {
    let body = format!(
        "set targetNote to first note whose name is \"{title}\"\n\
         return ((creation date of targetNote) as string) & \"{sep}\" & \
         ((modification date of targetNote) as string) & \"{sep}\" & (body of targetNote)",
        title = escape(title),
        sep = LIST_SEPARATOR,
    );
    in_folder(account, segments, &body, RETURN_ERROR)
}

/// Split a list result into trimmed, non-empty items
pub fn parse_list(output: &str) -> Vec<String> {
    output
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a [`note_info`] result.
///
/// The body may itself contain the separator, so only the first two are
/// significant.
pub fn parse_note_info(title: &str, output: &str) -> Option<NoteInfo> {
    if output.starts_with(ERROR_PREFIX) {
        return None;
    }
    let mut parts = output.splitn(3, LIST_SEPARATOR);
    let creation_date = parts.next()?;
    let modification_date = parts.next()?;
    let body = parts.next()?;
    Some(NoteInfo {
        title: title.to_string(),
        creation_date: creation_date.trim().to_string(),
        modification_date: modification_date.trim().to_string(),
        body: body.to_string(),
    })
}

/// Extract the message of an `error: ...` result
pub fn error_message(output: &str) -> Option<&str> {
    output.strip_prefix(ERROR_PREFIX).map(str::trim)
}
