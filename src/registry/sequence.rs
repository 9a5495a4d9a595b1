use super::{Registry, RegistryError};
use crate::allocator::SequenceCode;
use crate::config::MalformedCodePolicy;
use crate::shared::now_secs;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

pub(crate) const STUDENT_COUNTER: &str = "student";

impl Registry {
    /// Advances the student counter and returns the new code.
    ///
    /// The code is not attached to any student; admission and Access Number
    /// issuance allocate inside their own transactions instead.
    pub fn allocate_sequence_code(&self) -> Result<SequenceCode, RegistryError> {
        let code = self.with_write_lock(|tx| self.next_sequence_code(tx))?;
        self.log.info(
            "sequence.allocated",
            &[("code", Value::from(code.to_string()))],
        );
        Ok(code)
    }

    pub fn last_issued_sequence_code(&self) -> Result<Option<SequenceCode>, RegistryError> {
        let conn = self.db.connect()?;
        match read_counter(&conn)? {
            Some(raw) => SequenceCode::parse(&raw)
                .map(Some)
                .map_err(|source| RegistryError::MalformedStoredCode { value: raw, source }),
            None => Ok(None),
        }
    }

    /// Read-modify-write of the counter row. Callers must hold the write lock.
    pub(crate) fn next_sequence_code(
        &self,
        conn: &Connection,
    ) -> Result<SequenceCode, RegistryError> {
        let stored = match read_counter(conn)? {
            Some(raw) => self.parse_stored(raw)?,
            None => None,
        };
        let last = match stored {
            Some(code) => Some(code),
            None => self.highest_student_code(conn)?,
        };
        let next = SequenceCode::next_after(last.as_ref());

        conn.execute(
            "
            INSERT INTO sequence_counters (name, last_code, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(name) DO UPDATE SET
                last_code = excluded.last_code,
                updated_at = excluded.updated_at
            ",
            params![STUDENT_COUNTER, next.to_string(), now_secs()],
        )
        .map_err(RegistryError::sql)?;
        Ok(next)
    }

    fn parse_stored(&self, raw: String) -> Result<Option<SequenceCode>, RegistryError> {
        match SequenceCode::parse(&raw) {
            Ok(code) => Ok(Some(code)),
            Err(source) => match self.allocation.malformed_code_policy {
                MalformedCodePolicy::Reject => {
                    Err(RegistryError::MalformedStoredCode { value: raw, source })
                }
                MalformedCodePolicy::Restart => {
                    self.log.warn(
                        "sequence.malformed_code",
                        &[
                            ("stored", Value::from(raw)),
                            ("error", Value::from(source.to_string())),
                        ],
                    );
                    Ok(None)
                }
            },
        }
    }

    /// Seeds a missing or discarded counter from the codes already held by
    /// students.
    fn highest_student_code(
        &self,
        conn: &Connection,
    ) -> Result<Option<SequenceCode>, RegistryError> {
        let mut statement = conn
            .prepare("SELECT sequence_code FROM students WHERE sequence_code IS NOT NULL")
            .map_err(RegistryError::sql)?;
        let rows = statement
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(RegistryError::sql)?;

        let mut highest: Option<SequenceCode> = None;
        for row in rows {
            let raw = row.map_err(RegistryError::sql)?;
            if let Some(code) = self.parse_stored(raw)? {
                if highest.as_ref().map_or(true, |current| code > *current) {
                    highest = Some(code);
                }
            }
        }
        Ok(highest)
    }
}

fn read_counter(conn: &Connection) -> Result<Option<String>, RegistryError> {
    conn.query_row(
        "SELECT last_code FROM sequence_counters WHERE name = ?1",
        params![STUDENT_COUNTER],
        |row| row.get(0),
    )
    .optional()
    .map_err(RegistryError::sql)
}
