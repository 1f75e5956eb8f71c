//! 双向跳跃游标
//!
//! 在可索引序列上只停留于“可用”的位置。游标越过两端时停在哨兵 `-1` 或 `n` 上，
//! 因此可以同时推进前、中、后三个游标来遍历相邻元素，而无需额外的边界判断。

/// 判断某个下标是否可以被游标停留。
pub trait Eligibility {
    fn is_eligible(&self, index: usize) -> bool;
}

/// 双向跳跃游标。
///
/// 只保存原始下标、序列长度和一个借用的谓词；`advance`/`retreat` 返回移动前的下标。
#[derive(Debug, Clone, Copy)]
pub struct SkipCursor<E> {
    index: isize,
    len: isize,
    filter: E,
}

impl<E: Eligibility> SkipCursor<E> {
    /// 创建游标并停在第一个可用位置，没有可用位置时停在 `n`。
    pub fn new(len: usize, filter: E) -> Self {
        let mut cursor = Self {
            index: -1,
            len: len as isize,
            filter,
        };
        cursor.index = cursor.find_next(-1);
        cursor
    }

    fn eligible_at(&self, index: isize) -> bool {
        index >= 0 && index < self.len && self.filter.is_eligible(index as usize)
    }

    fn find_next(&self, from: isize) -> isize {
        let mut i = from + 1;
        while i < self.len {
            if self.eligible_at(i) {
                return i;
            }
            i += 1;
        }
        self.len
    }

    fn find_prev(&self, from: isize) -> isize {
        let mut i = from.min(self.len) - 1;
        while i >= 0 {
            if self.eligible_at(i) {
                return i;
            }
            i -= 1;
        }
        -1
    }

    /// 当前原始下标：开头之前为 `-1`，末尾之后为 `n`。
    pub const fn index(&self) -> isize {
        self.index
    }

    pub const fn has_next(&self) -> bool {
        self.index >= -1 && self.index < self.len
    }

    pub const fn has_prev(&self) -> bool {
        self.index > -1 && self.index <= self.len
    }

    /// 游标是否停在某个元素上（不在任一哨兵处）。
    pub const fn valid(&self) -> bool {
        self.index > -1 && self.index < self.len
    }

    pub const fn current(&self) -> Option<usize> {
        if self.valid() {
            Some(self.index as usize)
        } else {
            None
        }
    }

    /// 返回当前位置，然后前进到下一个可用位置。
    pub fn advance(&mut self) -> Option<usize> {
        let current = self.current();
        self.index = self.find_next(self.index);
        current
    }

    /// 返回当前位置，然后后退到上一个可用位置。
    pub fn retreat(&mut self) -> Option<usize> {
        let current = self.current();
        self.index = self.find_prev(self.index);
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy)]
    struct Flags<'a>(&'a [bool]);

    impl Eligibility for Flags<'_> {
        fn is_eligible(&self, index: usize) -> bool {
            self.0[index]
        }
    }

    #[test]
    fn test_cursor_skips_ineligible_positions() {
        let visible = [false, true, false, true, true];
        let mut cursor = SkipCursor::new(visible.len(), Flags(&visible));

        assert_eq!(cursor.index(), 1, "游标应停在第一个可用位置");
        assert_eq!(cursor.advance(), Some(1));
        assert_eq!(cursor.advance(), Some(3));
        assert_eq!(cursor.advance(), Some(4));
        assert_eq!(cursor.index(), 5);
        assert!(!cursor.valid());
        assert!(!cursor.has_next());
        assert!(cursor.has_prev());
        assert_eq!(cursor.advance(), None, "末尾哨兵处不再产出元素");
        assert_eq!(cursor.index(), 5);
    }

    #[test]
    fn test_cursor_retreats_to_leading_sentinel() {
        let eligible = [false, true, true];
        let mut cursor = SkipCursor::new(eligible.len(), Flags(&eligible));

        assert_eq!(cursor.retreat(), Some(1));
        assert_eq!(cursor.index(), -1, "越过开头后应停在 -1");
        assert!(cursor.has_next());
        assert!(!cursor.has_prev());
        assert_eq!(cursor.retreat(), None);

        // 从 -1 前进时先产出哨兵（None），再停到第一个可用位置
        assert_eq!(cursor.advance(), None);
        assert_eq!(cursor.index(), 1);
    }

    #[test]
    fn test_cursor_on_sequence_without_eligible_items() {
        let cursor = SkipCursor::new(3, Flags(&[false, false, false]));
        assert_eq!(cursor.index(), 3);
        assert!(!cursor.valid());

        let empty = SkipCursor::new(0, Flags(&[]));
        assert_eq!(empty.index(), 0);
        assert!(!empty.has_next());
    }

    #[test]
    fn test_cursor_retreat_from_end_sentinel() {
        let mut cursor = SkipCursor::new(4, Flags(&[true, false, true, false]));
        while cursor.advance().is_some() {}
        assert_eq!(cursor.index(), 4);
        assert_eq!(cursor.retreat(), None);
        assert_eq!(cursor.index(), 2);
        assert_eq!(cursor.retreat(), Some(2));
        assert_eq!(cursor.retreat(), Some(0));
        assert_eq!(cursor.index(), -1);
    }
}
