//! Lista duplamente encadeada de recência, indexada por arena.
//!
//! A cabeça é o item menos recente e a cauda o mais recente. Os links são
//! índices em um `Vec`, sem ponteiros crus; slots liberados são reciclados.

/// Referência estável a um nó da lista.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot(usize);

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
pub struct RecencyList<T> {
    nodes: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> RecencyList<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slot do item menos recente.
    pub fn front(&self) -> Option<Slot> {
        self.head.map(Slot)
    }

    /// Slot do item mais recente.
    pub fn back(&self) -> Option<Slot> {
        self.tail.map(Slot)
    }

    pub fn get(&self, slot: Slot) -> Option<&T> {
        self.node(slot.0).map(|n| &n.value)
    }

    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut T> {
        self.nodes
            .get_mut(slot.0)
            .and_then(Option::as_mut)
            .map(|n| &mut n.value)
    }

    /// Insere um valor na cauda em O(1).
    pub fn push_back(&mut self, value: T) -> Slot {
        let node = Node {
            value,
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.link_back(idx);
        self.len += 1;
        Slot(idx)
    }

    /// Remove o nó em O(1), devolvendo o valor. O slot deixa de ser válido.
    pub fn remove(&mut self, slot: Slot) -> Option<T> {
        self.node(slot.0)?;
        self.unlink(slot.0);
        let node = self.nodes[slot.0].take()?;
        self.free.push(slot.0);
        self.len -= 1;
        Some(node.value)
    }

    /// Move o nó para a cauda, marcando-o como mais recente. O slot é preservado.
    pub fn move_to_back(&mut self, slot: Slot) {
        if self.node(slot.0).is_none() || self.tail == Some(slot.0) {
            return;
        }
        self.unlink(slot.0);
        self.link_back(slot.0);
    }

    /// Itera do menos recente para o mais recente.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    fn node(&self, idx: usize) -> Option<&Node<T>> {
        self.nodes.get(idx).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, idx: usize) -> Option<&mut Node<T>> {
        self.nodes.get_mut(idx).and_then(Option::as_mut)
    }

    fn link_back(&mut self, idx: usize) {
        let old_tail = self.tail;
        if let Some(node) = self.node_mut(idx) {
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail.and_then(|t| self.node_mut(t)) {
            Some(tail) => tail.next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let Some((prev, next)) = self.node(idx).map(|n| (n.prev, n.next)) else {
            return;
        };

        match prev.and_then(|p| self.node_mut(p)) {
            Some(p) => p.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.node_mut(n)) {
            Some(n) => n.prev = prev,
            None => self.tail = prev,
        }

        if let Some(node) = self.node_mut(idx) {
            node.prev = None;
            node.next = None;
        }
    }
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.list.node(self.cursor?)?;
        self.cursor = node.next;
        Some(&node.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(list: &RecencyList<&'static str>) -> Vec<&'static str> {
        list.iter().copied().collect()
    }

    #[test]
    fn empty_list_has_no_ends() {
        let list: RecencyList<u8> = RecencyList::new();
        assert!(list.is_empty());
        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);
    }

    #[test]
    fn push_back_sets_head_on_first_insert() {
        let mut list = RecencyList::new();
        let a = list.push_back("a");
        assert_eq!(list.front(), Some(a));
        assert_eq!(list.back(), Some(a));

        let b = list.push_back("b");
        assert_eq!(list.front(), Some(a));
        assert_eq!(list.back(), Some(b));
        assert_eq!(collect(&list), vec!["a", "b"]);
    }

    #[test]
    fn remove_middle_relinks_neighbors() {
        let mut list = RecencyList::new();
        list.push_back("a");
        let b = list.push_back("b");
        list.push_back("c");

        assert_eq!(list.remove(b), Some("b"));
        assert_eq!(collect(&list), vec!["a", "c"]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn remove_head_and_tail() {
        let mut list = RecencyList::new();
        let a = list.push_back("a");
        list.push_back("b");
        let c = list.push_back("c");

        list.remove(a);
        assert_eq!(list.get(list.front().unwrap()), Some(&"b"));
        list.remove(c);
        assert_eq!(list.get(list.back().unwrap()), Some(&"b"));
        assert_eq!(list.front(), list.back());
    }

    #[test]
    fn remove_only_node_empties_list() {
        let mut list = RecencyList::new();
        let a = list.push_back("a");
        list.remove(a);
        assert!(list.is_empty());
        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);
    }

    #[test]
    fn removed_slot_is_stale() {
        let mut list = RecencyList::new();
        let a = list.push_back("a");
        list.remove(a);
        assert_eq!(list.remove(a), None);
        assert_eq!(list.get(a), None);
    }

    #[test]
    fn move_to_back_reorders() {
        let mut list = RecencyList::new();
        let a = list.push_back("a");
        list.push_back("b");
        list.push_back("c");

        list.move_to_back(a);
        assert_eq!(collect(&list), vec!["b", "c", "a"]);
        assert_eq!(list.back(), Some(a));

        // Já na cauda: nada muda
        list.move_to_back(a);
        assert_eq!(collect(&list), vec!["b", "c", "a"]);
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut list = RecencyList::new();
        let a = list.push_back("a");
        list.push_back("b");
        list.remove(a);
        let c = list.push_back("c");
        assert_eq!(c, a);
        assert_eq!(collect(&list), vec!["b", "c"]);
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut list = RecencyList::new();
        let a = list.push_back(String::from("a"));
        list.get_mut(a).unwrap().push('!');
        assert_eq!(list.get(a).map(String::as_str), Some("a!"));
    }
}
