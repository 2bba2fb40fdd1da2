//! Collection kinds: what differs between syncing contacts and calendars.
//!
//! The engine drives the same phases for every collection. A
//! [`CollectionKind`] supplies the pieces that depend on the content type:
//! where a payload keeps its uid, which notification slot failures use, and
//! the optional hooks that run around remote application.

use async_trait::async_trait;

use journal_sync_core::{CoreError, Resource};
use journal_sync_store::ResourceStore;

use crate::error::Result;
use crate::session::LocalIndex;

/// Notification slot for address book failures.
pub const NOTIFICATION_CONTACTS_SYNC: u32 = 10;

/// Notification slot for calendar failures.
pub const NOTIFICATION_CALENDAR_SYNC: u32 = 11;

/// Per-content-type behavior of a collection.
#[async_trait]
pub trait CollectionKind: Send + Sync {
    /// Notification slot used for this collection's errors.
    fn notification_id(&self) -> u32;

    /// Title of the error notification.
    fn sync_error_title(&self) -> String;

    /// Uid of the resource a payload describes.
    fn extract_uid(&self, content: &str) -> std::result::Result<String, CoreError>;

    /// Content to publish for `resource`, carrying `uid`.
    fn outgoing_content(&self, resource: &Resource, uid: &str) -> String {
        let _ = uid;
        resource.content.clone()
    }

    /// Whether the session should run at all.
    async fn prepare(&self, store: &dyn ResourceStore) -> Result<bool> {
        Ok(store.collection_exists().await?)
    }

    /// Runs after remote entries are applied and before local ones are
    /// pushed.
    async fn apply_local_entries(&self, store: &dyn ResourceStore, local: &LocalIndex) -> Result<()> {
        let _ = (store, local);
        Ok(())
    }

    /// Runs after the push.
    async fn post_process(&self, store: &dyn ResourceStore) -> Result<()> {
        let _ = store;
        Ok(())
    }
}

/// An address book of vCards.
#[derive(Debug, Clone)]
pub struct ContactsCollection {
    account: String,
}

impl ContactsCollection {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }
}

#[async_trait]
impl CollectionKind for ContactsCollection {
    fn notification_id(&self) -> u32 {
        NOTIFICATION_CONTACTS_SYNC
    }

    fn sync_error_title(&self) -> String {
        format!("Address book sync failed ({})", self.account)
    }

    fn extract_uid(&self, content: &str) -> std::result::Result<String, CoreError> {
        uid_property(content)
    }

    fn outgoing_content(&self, resource: &Resource, uid: &str) -> String {
        with_uid_property(&resource.content, uid, "VCARD")
    }
}

/// A calendar of iCalendar objects (events, tasks).
#[derive(Debug, Clone)]
pub struct CalendarCollection {
    account: String,
}

impl CalendarCollection {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }
}

#[async_trait]
impl CollectionKind for CalendarCollection {
    fn notification_id(&self) -> u32 {
        NOTIFICATION_CALENDAR_SYNC
    }

    fn sync_error_title(&self) -> String {
        format!("Calendar sync failed ({})", self.account)
    }

    fn extract_uid(&self, content: &str) -> std::result::Result<String, CoreError> {
        uid_property(content)
    }

    fn outgoing_content(&self, resource: &Resource, uid: &str) -> String {
        let component = ["VEVENT", "VTODO", "VJOURNAL"]
            .into_iter()
            .find(|c| content_lines(&resource.content).any(|l| is_begin(l, c)))
            .unwrap_or("VCALENDAR");
        with_uid_property(&resource.content, uid, component)
    }
}

fn content_lines(content: &str) -> impl Iterator<Item = &str> {
    content.lines().map(|l| l.trim_end_matches('\r'))
}

/// A folded property continues on lines starting with a space or tab.
fn is_continuation(line: &str) -> bool {
    line.starts_with([' ', '\t'])
}

/// Logical property lines, with folded lines joined back together.
fn unfolded_lines(content: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in content_lines(content) {
        match lines.last_mut() {
            Some(last) if is_continuation(line) => last.push_str(&line[1..]),
            _ => lines.push(line.to_string()),
        }
    }
    lines
}

fn is_begin(line: &str, component: &str) -> bool {
    line.eq_ignore_ascii_case(&format!("BEGIN:{component}"))
}

/// Value of the first `UID` property line, parameters allowed.
fn uid_value(line: &str) -> Option<&str> {
    let (name, value) = line.split_once(':')?;
    let name = name.split(';').next()?;
    name.eq_ignore_ascii_case("UID").then(|| value.trim())
}

/// Read the `UID` property of a vCard or iCalendar text.
pub fn uid_property(content: &str) -> std::result::Result<String, CoreError> {
    let lines = unfolded_lines(content);
    match lines.iter().find_map(|l| uid_value(l)) {
        Some(uid) if !uid.is_empty() => Ok(uid.to_string()),
        Some(_) => Err(CoreError::SchemaError("empty UID property".into())),
        None => Err(CoreError::SchemaError("missing UID property".into())),
    }
}

/// Return `content` with its first `UID` property set to `uid`.
///
/// A missing property is inserted right after `BEGIN:<component>`, or at the
/// top when there is no such line.
pub fn with_uid_property(content: &str, uid: &str, component: &str) -> String {
    if matches!(uid_property(content), Ok(existing) if existing == uid) {
        return content.to_string();
    }

    let eol = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let uid_line = format!("UID:{uid}");
    let mut lines: Vec<String> = content_lines(content).map(String::from).collect();

    if let Some(pos) = lines.iter().position(|l| uid_value(l).is_some()) {
        let folded = lines[pos + 1..]
            .iter()
            .take_while(|l| is_continuation(l))
            .count();
        lines.splice(pos..=pos + folded, [uid_line]);
    } else if let Some(pos) = lines.iter().position(|l| is_begin(l, component)) {
        lines.insert(pos + 1, uid_line);
    } else {
        lines.insert(0, uid_line);
    }

    let mut out = lines.join(eol);
    if content.ends_with('\n') {
        out.push_str(eol);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const VCARD: &str = "BEGIN:VCARD\r\nVERSION:4.0\r\nUID:urn:uuid:1234\r\nFN:Ada\r\nEND:VCARD\r\n";

    #[test]
    fn test_extract_uid() {
        let contacts = ContactsCollection::new("alice");
        assert_eq!(contacts.extract_uid(VCARD).unwrap(), "urn:uuid:1234");
        assert_eq!(
            uid_property("BEGIN:VEVENT\nuid;X-PARAM=1:ev-1\nEND:VEVENT").unwrap(),
            "ev-1"
        );
    }

    #[test]
    fn test_missing_uid_is_schema_error() {
        assert!(matches!(
            uid_property("BEGIN:VCARD\nFN:Ada\nEND:VCARD"),
            Err(CoreError::SchemaError(_))
        ));
        assert!(matches!(uid_property("UID:  "), Err(CoreError::SchemaError(_))));
    }

    #[test]
    fn test_uid_inserted_after_begin() {
        let resource = Resource::new_local(1, None, "BEGIN:VCARD\r\nFN:Ada\r\nEND:VCARD\r\n");
        let out = ContactsCollection::new("a").outgoing_content(&resource, "u-1");
        assert_eq!(out, "BEGIN:VCARD\r\nUID:u-1\r\nFN:Ada\r\nEND:VCARD\r\n");
    }

    #[test]
    fn test_uid_replaced_and_unchanged_when_matching() {
        let resource = Resource::new_local(1, None, VCARD);
        let kind = ContactsCollection::new("a");
        assert_eq!(kind.outgoing_content(&resource, "urn:uuid:1234"), VCARD);

        let out = kind.outgoing_content(&resource, "other");
        assert_eq!(uid_property(&out).unwrap(), "other");
        assert_eq!(out.matches("UID").count(), 1);
    }

    #[test]
    fn test_calendar_uid_goes_into_component() {
        let resource = Resource::new_local(
            1,
            None,
            "BEGIN:VCALENDAR\nBEGIN:VEVENT\nSUMMARY:x\nEND:VEVENT\nEND:VCALENDAR",
        );
        let out = CalendarCollection::new("a").outgoing_content(&resource, "ev");
        assert_eq!(
            out,
            "BEGIN:VCALENDAR\nBEGIN:VEVENT\nUID:ev\nSUMMARY:x\nEND:VEVENT\nEND:VCALENDAR"
        );
    }

    #[test]
    fn test_folded_uid_is_unfolded() {
        let folded = "BEGIN:VCARD\r\nUID:urn:uuid:0123456789\r\n abcdef\r\n\t-tail\r\nFN:Ada\r\nEND:VCARD\r\n";
        assert_eq!(uid_property(folded).unwrap(), "urn:uuid:0123456789abcdef-tail");

        let resource = Resource::new_local(1, None, folded);
        let kind = ContactsCollection::new("a");
        assert_eq!(
            kind.outgoing_content(&resource, "urn:uuid:0123456789abcdef-tail"),
            folded
        );
        assert_eq!(
            kind.outgoing_content(&resource, "short"),
            "BEGIN:VCARD\r\nUID:short\r\nFN:Ada\r\nEND:VCARD\r\n"
        );
    }

    #[test]
    fn test_opaque_content_gets_uid_on_top() {
        assert_eq!(with_uid_property("hello", "u", "VCARD"), "UID:u\nhello");
    }

    #[test]
    fn test_titles_and_slots_differ() {
        let contacts = ContactsCollection::new("alice");
        let calendar = CalendarCollection::new("alice");
        assert_ne!(contacts.notification_id(), calendar.notification_id());
        assert!(contacts.sync_error_title().contains("alice"));
    }
}
