//! Shared support for integration tests: the plain-text fixture format and
//! the brute-force oracle checks replayed after every action.

use std::fs;
use std::path::PathBuf;

use otoro_core::{ExtremesPromotion, MTree, MTreeBuilder, euclidean_distance};

pub type Point = Vec<i32>;
pub type PointMetric = fn(&Point, &Point) -> f64;

pub fn euclid(a: &Point, b: &Point) -> f64 {
    euclidean_distance(a, b)
}

/// One fixture record: an add or remove, followed by a range and a limit
/// query on the given point.
#[derive(Clone, Debug)]
pub struct Action {
    pub cmd: Command,
    pub data: Point,
    pub query: Point,
    pub radius: f64,
    pub limit: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    Add,
    Remove,
}

/// A parsed fixture: `<dimensions>`, `<count>`, then `count` records of
/// `<cmd> <data_vec> <query_vec> <radius> <limit>`.
#[derive(Clone, Debug)]
pub struct Fixture {
    pub dimensions: usize,
    pub actions: Vec<Action>,
}

impl Fixture {
    pub fn load(name: &str) -> Self {
        let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "fixtures", name]
            .iter()
            .collect();
        let text = fs::read_to_string(&path)
            .unwrap_or_else(|err| panic!("fixture {} must be readable: {err}", path.display()));
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Self {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());
        let dimensions: usize = lines
            .next()
            .expect("fixture starts with the dimension count")
            .trim()
            .parse()
            .expect("dimensions is an integer");
        let count: usize = lines
            .next()
            .expect("fixture declares the record count")
            .trim()
            .parse()
            .expect("count is an integer");

        let actions: Vec<Action> = lines
            .take(count)
            .map(|line| parse_action(line, dimensions))
            .collect();
        assert_eq!(actions.len(), count, "fixture is shorter than declared");
        Self {
            dimensions,
            actions,
        }
    }
}

fn parse_action(line: &str, dimensions: usize) -> Action {
    let mut fields = line.split_whitespace();
    let cmd = match fields.next().expect("record starts with a command") {
        "A" => Command::Add,
        "R" => Command::Remove,
        other => panic!("unknown fixture command `{other}`"),
    };
    let mut vector = |what: &str| -> Point {
        (0..dimensions)
            .map(|_| {
                fields
                    .next()
                    .unwrap_or_else(|| panic!("record is missing a {what} component"))
                    .parse()
                    .expect("vector components are integers")
            })
            .collect()
    };
    let data = vector("data");
    let query = vector("query");
    let radius: f64 = fields
        .next()
        .expect("record carries a radius")
        .parse()
        .expect("radius is a float");
    let limit: usize = fields
        .next()
        .expect("record carries a limit")
        .parse()
        .expect("limit is an integer");
    assert!(fields.next().is_none(), "record has trailing fields");
    Action {
        cmd,
        data,
        query,
        radius,
        limit,
    }
}

pub fn deterministic_tree() -> MTree<Point, PointMetric, ExtremesPromotion> {
    MTreeBuilder::new(euclid as PointMetric)
        .with_min_node_capacity(2)
        .with_max_node_capacity(3)
        .with_promotion(ExtremesPromotion)
        .build()
        .expect("fixture capacities are valid")
}

/// Checks a range query against a brute-force scan of the live set.
pub fn check_nearest_by_range(
    tree: &MTree<Point, PointMetric, ExtremesPromotion>,
    live: &[Point],
    query: &Point,
    radius: f64,
) {
    let results: Vec<(Point, f64)> = tree
        .nearest_by_range(query.clone(), radius)
        .map(|neighbour| (neighbour.item.clone(), neighbour.distance))
        .collect();

    let mut previous = 0.0_f64;
    for (item, distance) in &results {
        assert!(*distance >= previous, "distances must be non-decreasing");
        previous = *distance;
        assert!(*distance <= radius);
        assert_eq!(*distance, euclid(item, query));
        assert!(live.contains(item));
    }

    let yielded: Vec<&Point> = results.iter().map(|(item, _)| item).collect();
    for item in live {
        let distance = euclid(item, query);
        if distance <= radius {
            assert_eq!(
                yielded.iter().filter(|hit| **hit == item).count(),
                1,
                "an in-range live item must be yielded exactly once"
            );
        } else {
            assert!(!yielded.contains(&item), "an out-of-range item was yielded");
        }
    }
}

/// Checks a limit query against a brute-force scan of the live set,
/// tolerating ties at the boundary rank.
pub fn check_nearest_by_limit(
    tree: &MTree<Point, PointMetric, ExtremesPromotion>,
    live: &[Point],
    query: &Point,
    limit: usize,
) {
    let results: Vec<(Point, f64)> = tree
        .nearest_by_limit(query.clone(), limit)
        .map(|neighbour| (neighbour.item.clone(), neighbour.distance))
        .collect();

    assert_eq!(results.len(), limit.min(live.len()));

    let mut previous = 0.0_f64;
    let mut farthest = 0.0_f64;
    for (item, distance) in &results {
        assert!(*distance >= previous, "distances must be non-decreasing");
        previous = *distance;
        assert_eq!(*distance, euclid(item, query));
        assert!(live.contains(item));
        assert_eq!(
            results.iter().filter(|(hit, _)| hit == item).count(),
            1,
            "items must not repeat"
        );
        farthest = farthest.max(*distance);
    }

    let yielded: Vec<&Point> = results.iter().map(|(item, _)| item).collect();
    for item in live {
        let distance = euclid(item, query);
        if distance < farthest {
            assert!(
                yielded.contains(&item),
                "an item closer than the boundary rank must be yielded"
            );
        } else if distance > farthest {
            assert!(
                !yielded.contains(&item),
                "an item beyond the boundary rank must not be yielded"
            );
        }
    }
}
