use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighbor {
    pub node: usize,
    pub link: usize,
}

/// Forward and reverse neighbor lists, indexed by node.
#[derive(Clone, Debug, Default)]
pub struct Adjacency {
    forward: Vec<Vec<Neighbor>>,
    reverse: Vec<Vec<Neighbor>>,
}

impl Adjacency {
    pub fn build(node_count: usize, edges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut forward = vec![Vec::new(); node_count];
        let mut reverse = vec![Vec::new(); node_count];

        for (link, (source, target)) in edges.into_iter().enumerate() {
            if source >= node_count || target >= node_count {
                continue;
            }
            forward[source].push(Neighbor { node: target, link });
            reverse[target].push(Neighbor { node: source, link });
        }

        Self { forward, reverse }
    }

    pub fn node_count(&self) -> usize {
        self.forward.len()
    }

    pub fn neighbors(&self, node: usize, direction: Direction) -> &[Neighbor] {
        let lists = match direction {
            Direction::Forward => &self.forward,
            Direction::Reverse => &self.reverse,
        };
        lists.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn undirected(&self, node: usize) -> impl Iterator<Item = Neighbor> + '_ {
        self.neighbors(node, Direction::Forward)
            .iter()
            .chain(self.neighbors(node, Direction::Reverse))
            .copied()
    }

    pub fn degree(&self, node: usize) -> usize {
        self.neighbors(node, Direction::Forward).len()
            + self.neighbors(node, Direction::Reverse).len()
    }

    /// Every node reachable from `start` ignoring link direction, `start` first.
    pub fn component(&self, start: usize) -> Vec<usize> {
        if start >= self.node_count() {
            return Vec::new();
        }

        let mut visited = vec![false; self.node_count()];
        let mut queue = VecDeque::from([start]);
        let mut members = Vec::new();
        visited[start] = true;

        while let Some(current) = queue.pop_front() {
            members.push(current);
            for neighbor in self.undirected(current) {
                if !visited[neighbor.node] {
                    visited[neighbor.node] = true;
                    queue.push_back(neighbor.node);
                }
            }
        }

        members
    }
}
