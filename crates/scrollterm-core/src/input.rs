//! Pending-keystroke queue with a paste side channel.
//!
//! Keys arrive from the host already translated into [`Key`] values. The
//! queue is a bounded FIFO: overflow drops the key and reports it so the
//! host can ring the bell, never blocking. A paste installs a byte string
//! that is consumed one byte per pop. Keys that were already queued when
//! the paste landed drain first, tracked by the `already` counter, so a
//! paste arriving mid-line is not interleaved into keystrokes that
//! predate it.

use std::collections::VecDeque;

/// One unit of editor input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable byte to insert.
    Char(u8),
    /// Submit the line.
    Enter,
    /// Cursor to start of editable text.
    MoveToStart,
    /// Cursor to end of line.
    MoveToEnd,
    /// Cursor left one byte.
    MoveLeft,
    /// Cursor right one byte.
    MoveRight,
    /// Recall the previous history entry.
    HistoryPrev,
    /// Recall the next history entry.
    HistoryNext,
    /// Truncate from the cursor to the line end.
    KillToEnd,
    /// Erase all editable text.
    KillLine,
    /// Delete the byte before the cursor.
    Backspace,
    /// Delete the byte under the cursor.
    DeleteForward,
    /// Swap the two bytes before the cursor.
    Transpose,
    /// Toggle overwrite mode.
    OverwriteToggle,
    /// End of input: submit and stop reading.
    EndOfInput,
}

impl Key {
    /// Translate a raw byte into a key, using the classic control-code
    /// assignments (^A start, ^E end, ^B/^F left/right, ^P/^N history,
    /// ^K/^U kill, ^H/^D delete, ^T transpose, ^O overwrite, ^Z EOF).
    /// Bytes above `0x1f` are printable. Unassigned control bytes map to
    /// `None` and are ignored.
    #[must_use]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Key::MoveToStart),
            0x02 => Some(Key::MoveLeft),
            0x04 => Some(Key::DeleteForward),
            0x05 => Some(Key::MoveToEnd),
            0x06 => Some(Key::MoveRight),
            0x08 => Some(Key::Backspace),
            0x0b => Some(Key::KillToEnd),
            b'\n' => Some(Key::Enter),
            0x0e => Some(Key::HistoryNext),
            0x0f => Some(Key::OverwriteToggle),
            0x10 => Some(Key::HistoryPrev),
            0x14 => Some(Key::Transpose),
            0x15 => Some(Key::KillLine),
            0x1a => Some(Key::EndOfInput),
            c if c > 0x1f => Some(Key::Char(c)),
            _ => None,
        }
    }
}

/// Result of pushing a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Key queued.
    Queued,
    /// Queue full: key dropped, host should ring the bell.
    Dropped,
}

#[derive(Debug)]
struct PasteState {
    bytes: Vec<u8>,
    pos: usize,
}

/// Bounded keystroke FIFO plus optional pending paste.
#[derive(Debug)]
pub struct InputQueue {
    keys: VecDeque<Key>,
    capacity: usize,
    paste: Option<PasteState>,
    /// Keys queued before the current paste; they drain first.
    already: usize,
    /// Keys dropped to overflow since creation.
    dropped: u64,
}

impl InputQueue {
    /// Create a queue holding at most `capacity` keys.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            keys: VecDeque::with_capacity(capacity),
            capacity,
            paste: None,
            already: 0,
            dropped: 0,
        }
    }

    /// Queued key count (paste bytes not included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when no key or paste byte is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.paste.is_none()
    }

    /// Keys dropped to overflow since creation.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Queue one key.
    pub fn push(&mut self, key: Key) -> PushOutcome {
        if self.keys.len() >= self.capacity {
            self.dropped += 1;
            return PushOutcome::Dropped;
        }
        self.keys.push_back(key);
        PushOutcome::Queued
    }

    /// Install pasted bytes. A paste landing while one is already pending
    /// appends to it; otherwise the current queue depth is remembered so
    /// those earlier keys drain before the paste.
    pub fn push_paste(&mut self, bytes: &[u8]) {
        match &mut self.paste {
            Some(paste) => paste.bytes.extend_from_slice(bytes),
            None => {
                if bytes.is_empty() {
                    return;
                }
                self.already = self.keys.len();
                self.paste = Some(PasteState {
                    bytes: bytes.to_vec(),
                    pos: 0,
                });
            }
        }
    }

    /// Take the next unit of input: pre-paste keys first, then paste
    /// bytes, then live keys. Unassigned paste bytes are skipped.
    pub fn pop(&mut self) -> Option<Key> {
        loop {
            if self.already == 0 {
                if let Some(paste) = &mut self.paste {
                    let next = paste.bytes.get(paste.pos).copied();
                    match next {
                        Some(b) => {
                            paste.pos += 1;
                            if paste.pos >= paste.bytes.len() {
                                self.paste = None;
                            }
                            match Key::from_byte(b) {
                                Some(key) => return Some(key),
                                None => continue,
                            }
                        }
                        None => self.paste = None,
                    }
                }
            }
            let key = self.keys.pop_front()?;
            self.already = self.already.saturating_sub(1);
            return Some(key);
        }
    }

    /// Return the most recently consumed key to the front of the queue.
    ///
    /// Used when a printable key at the end of a full line must first
    /// submit the line and then replay as the first key of the next read.
    pub fn unpop(&mut self, key: Key) {
        self.keys.push_front(key);
        if self.already > 0 {
            self.already += 1;
        }
    }

    /// Queue a synthetic command: home, kill-to-end, the command bytes,
    /// newline. If the user was mid-line, `saved` carries the editable
    /// text and cursor offset; it is replayed as keystrokes after the
    /// command so the half-typed line survives. Returns how many keys
    /// were dropped to overflow.
    pub fn inject_command(&mut self, command: &[u8], saved: Option<(&[u8], usize)>) -> usize {
        let mut dropped = 0;
        let mut put = |queue: &mut Self, key: Key| {
            if queue.push(key) == PushOutcome::Dropped {
                dropped += 1;
            }
        };
        put(self, Key::MoveToStart);
        put(self, Key::KillToEnd);
        for &b in command {
            if let Some(key) = Key::from_byte(b) {
                put(self, key);
            }
        }
        put(self, Key::Enter);
        if let Some((line, cursor)) = saved {
            for &b in line {
                if let Some(key) = Key::from_byte(b) {
                    put(self, key);
                }
            }
            for _ in cursor..line.len() {
                put(self, Key::MoveLeft);
            }
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut q = InputQueue::new(8);
        q.push(Key::Char(b'a'));
        q.push(Key::Char(b'b'));
        q.push(Key::Enter);
        assert_eq!(q.pop(), Some(Key::Char(b'a')));
        assert_eq!(q.pop(), Some(Key::Char(b'b')));
        assert_eq!(q.pop(), Some(Key::Enter));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_overflow_drops_and_retains_order() {
        let n = 4;
        let mut q = InputQueue::new(n);
        let mut dropped = 0;
        for c in 0..=n as u8 {
            if q.push(Key::Char(b'0' + c)) == PushOutcome::Dropped {
                dropped += 1;
            }
        }
        assert_eq!(dropped, 1);
        assert_eq!(q.dropped(), 1);
        let drained: Vec<_> = std::iter::from_fn(|| q.pop()).collect();
        let expected: Vec<_> = (0..n as u8).map(|c| Key::Char(b'0' + c)).collect();
        assert_eq!(drained, expected);
    }

    #[test]
    fn test_paste_waits_for_earlier_keys() {
        let mut q = InputQueue::new(8);
        q.push(Key::Char(b'x'));
        q.push_paste(b"ab");
        q.push(Key::Char(b'y'));
        assert_eq!(q.pop(), Some(Key::Char(b'x')), "pre-paste key first");
        assert_eq!(q.pop(), Some(Key::Char(b'a')));
        assert_eq!(q.pop(), Some(Key::Char(b'b')));
        assert_eq!(q.pop(), Some(Key::Char(b'y')));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_paste_newline_submits_and_cr_skipped() {
        let mut q = InputQueue::new(8);
        q.push_paste(b"a\r\nb");
        assert_eq!(q.pop(), Some(Key::Char(b'a')));
        assert_eq!(q.pop(), Some(Key::Enter));
        assert_eq!(q.pop(), Some(Key::Char(b'b')));
        assert_eq!(q.pop(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn test_second_paste_appends() {
        let mut q = InputQueue::new(8);
        q.push_paste(b"ab");
        q.push_paste(b"cd");
        let drained: Vec<_> = std::iter::from_fn(|| q.pop()).collect();
        assert_eq!(
            drained,
            vec![
                Key::Char(b'a'),
                Key::Char(b'b'),
                Key::Char(b'c'),
                Key::Char(b'd')
            ]
        );
    }

    #[test]
    fn test_unpop_returns_key_to_front() {
        let mut q = InputQueue::new(8);
        q.push(Key::Char(b'b'));
        q.unpop(Key::Char(b'a'));
        assert_eq!(q.pop(), Some(Key::Char(b'a')));
        assert_eq!(q.pop(), Some(Key::Char(b'b')));
    }

    #[test]
    fn test_inject_command_sequence() {
        let mut q = InputQueue::new(32);
        let dropped = q.inject_command(b"ls", Some((b"half", 2)));
        assert_eq!(dropped, 0);
        let drained: Vec<_> = std::iter::from_fn(|| q.pop()).collect();
        assert_eq!(
            drained,
            vec![
                Key::MoveToStart,
                Key::KillToEnd,
                Key::Char(b'l'),
                Key::Char(b's'),
                Key::Enter,
                Key::Char(b'h'),
                Key::Char(b'a'),
                Key::Char(b'l'),
                Key::Char(b'f'),
                Key::MoveLeft,
                Key::MoveLeft,
            ]
        );
    }
}
