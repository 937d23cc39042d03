//! Árvore AVL indexada por posição no anel (`u32`).
//!
//! Cada nó pertence ao pai (sem back-pointers). `successor` e `ceiling`
//! descem a partir da raiz comparando chaves, e a remoção com dois filhos
//! realoca o sucessor para o slot removido.

use std::cmp::Ordering;

type Link<V> = Option<Box<Node<V>>>;

#[derive(Debug, Clone)]
struct Node<V> {
    key: u32,
    value: V,
    height: usize,
    left: Link<V>,
    right: Link<V>,
}

impl<V> Node<V> {
    fn leaf(key: u32, value: V) -> Self {
        Self {
            key,
            value,
            height: 1,
            left: None,
            right: None,
        }
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    fn balance_factor(&self) -> isize {
        height(&self.left) as isize - height(&self.right) as isize
    }
}

fn height<V>(link: &Link<V>) -> usize {
    link.as_ref().map_or(0, |n| n.height)
}

#[derive(Debug, Clone)]
pub struct AvlTree<V> {
    root: Link<V>,
    len: usize,
}

impl<V> AvlTree<V> {
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn height(&self) -> usize {
        height(&self.root)
    }

    pub fn get(&self, key: u32) -> Option<&V> {
        let mut cursor = self.root.as_deref();
        while let Some(node) = cursor {
            cursor = match key.cmp(&node.key) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(&node.value),
            };
        }
        None
    }

    /// Insere ou sobrescreve. Retorna o valor anterior, se havia.
    pub fn insert(&mut self, key: u32, value: V) -> Option<V> {
        let (root, old) = insert_node(self.root.take(), key, value);
        self.root = Some(root);
        if old.is_none() {
            self.len += 1;
        }
        old
    }

    pub fn remove(&mut self, key: u32) -> Option<V> {
        let (root, removed) = remove_node(self.root.take(), key);
        self.root = root;
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Menor chave `>= key`, ou None se não houver.
    pub fn ceiling(&self, key: u32) -> Option<(u32, &V)> {
        let mut cursor = self.root.as_deref();
        let mut candidate = None;
        while let Some(node) = cursor {
            match node.key.cmp(&key) {
                Ordering::Equal => return Some((node.key, &node.value)),
                Ordering::Greater => {
                    candidate = Some(node);
                    cursor = node.left.as_deref();
                }
                Ordering::Less => cursor = node.right.as_deref(),
            }
        }
        candidate.map(|n| (n.key, &n.value))
    }

    /// Menor chave `> key`, ou None no máximo.
    pub fn successor(&self, key: u32) -> Option<(u32, &V)> {
        let mut cursor = self.root.as_deref();
        let mut candidate = None;
        while let Some(node) = cursor {
            if node.key > key {
                candidate = Some(node);
                cursor = node.left.as_deref();
            } else {
                cursor = node.right.as_deref();
            }
        }
        candidate.map(|n| (n.key, &n.value))
    }

    pub fn first(&self) -> Option<(u32, &V)> {
        let mut node = self.root.as_deref()?;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        Some((node.key, &node.value))
    }

    pub fn last(&self) -> Option<(u32, &V)> {
        let mut node = self.root.as_deref()?;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        Some((node.key, &node.value))
    }

    /// Percurso em ordem crescente de chave.
    pub fn iter(&self) -> Iter<'_, V> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left(self.root.as_deref());
        iter
    }

    pub fn keys(&self) -> impl Iterator<Item = u32> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Verifica o invariante AVL, as alturas armazenadas e a ordem das chaves.
    pub fn is_balanced(&self) -> bool {
        check(&self.root, None, None).is_some()
    }
}

impl<V> Default for AvlTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Iter<'a, V> {
    stack: Vec<&'a Node<V>>,
}

impl<'a, V> Iter<'a, V> {
    fn push_left(&mut self, mut cursor: Option<&'a Node<V>>) {
        while let Some(node) = cursor {
            self.stack.push(node);
            cursor = node.left.as_deref();
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (u32, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        Some((node.key, &node.value))
    }
}

fn insert_node<V>(link: Link<V>, key: u32, value: V) -> (Box<Node<V>>, Option<V>) {
    let Some(mut node) = link else {
        return (Box::new(Node::leaf(key, value)), None);
    };

    let old = match key.cmp(&node.key) {
        Ordering::Less => {
            let (child, old) = insert_node(node.left.take(), key, value);
            node.left = Some(child);
            old
        }
        Ordering::Greater => {
            let (child, old) = insert_node(node.right.take(), key, value);
            node.right = Some(child);
            old
        }
        Ordering::Equal => {
            let old = std::mem::replace(&mut node.value, value);
            return (node, Some(old));
        }
    };

    (rebalance(node), old)
}

fn remove_node<V>(link: Link<V>, key: u32) -> (Link<V>, Option<V>) {
    let Some(mut node) = link else {
        return (None, None);
    };

    match key.cmp(&node.key) {
        Ordering::Less => {
            let (child, removed) = remove_node(node.left.take(), key);
            node.left = child;
            (Some(rebalance(node)), removed)
        }
        Ordering::Greater => {
            let (child, removed) = remove_node(node.right.take(), key);
            node.right = child;
            (Some(rebalance(node)), removed)
        }
        Ordering::Equal => {
            let Node {
                value, left, right, ..
            } = *node;
            let replacement = match (left, right) {
                (None, None) => None,
                (Some(child), None) | (None, Some(child)) => Some(child),
                (Some(left), Some(right)) => {
                    let (rest, mut successor) = take_min(right);
                    successor.left = Some(left);
                    successor.right = rest;
                    Some(rebalance(successor))
                }
            };
            (replacement, Some(value))
        }
    }
}

/// Destaca o menor nó da subárvore, devolvendo (subárvore restante, nó).
fn take_min<V>(mut node: Box<Node<V>>) -> (Link<V>, Box<Node<V>>) {
    match node.left.take() {
        None => {
            let rest = node.right.take();
            (rest, node)
        }
        Some(left) => {
            let (rest, min) = take_min(left);
            node.left = rest;
            (Some(rebalance(node)), min)
        }
    }
}

/// Restaura |bf| <= 1 no nó com rotações LL, LR, RR ou RL.
fn rebalance<V>(mut node: Box<Node<V>>) -> Box<Node<V>> {
    node.update_height();
    let balance = node.balance_factor();

    if balance > 1 {
        if node.left.as_ref().is_some_and(|l| l.balance_factor() < 0) {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }
    if balance < -1 {
        if node.right.as_ref().is_some_and(|r| r.balance_factor() > 0) {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }

    node
}

fn rotate_right<V>(mut node: Box<Node<V>>) -> Box<Node<V>> {
    let Some(mut pivot) = node.left.take() else {
        return node;
    };
    node.left = pivot.right.take();
    node.update_height();
    pivot.right = Some(node);
    pivot.update_height();
    pivot
}

fn rotate_left<V>(mut node: Box<Node<V>>) -> Box<Node<V>> {
    let Some(mut pivot) = node.right.take() else {
        return node;
    };
    node.right = pivot.left.take();
    node.update_height();
    pivot.left = Some(node);
    pivot.update_height();
    pivot
}

/// Retorna a altura da subárvore se ela for uma AVL válida dentro de (lo, hi).
fn check<V>(link: &Link<V>, lo: Option<u32>, hi: Option<u32>) -> Option<usize> {
    let Some(node) = link else {
        return Some(0);
    };
    if lo.is_some_and(|lo| node.key <= lo) || hi.is_some_and(|hi| node.key >= hi) {
        return None;
    }
    let left = check(&node.left, lo, Some(node.key))?;
    let right = check(&node.right, Some(node.key), hi)?;
    let h = 1 + left.max(right);
    (left.abs_diff(right) <= 1 && node.height == h).then_some(h)
}
