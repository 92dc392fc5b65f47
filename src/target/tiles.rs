use super::{TargetError, Targeter};
use crate::types::Target;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BboxError {
    #[error("bounding box must be min_x,min_y,max_x,max_y[,zoom], got {0:?}")]
    Malformed(String),
    #[error("bounding box coordinate {0:?} is not an integer")]
    Coordinate(String),
    #[error("bounding box is empty or inverted: {0}")]
    Degenerate(Bbox),
    #[error("bounding box {bbox} does not fit the zoom {zoom} grid (max coordinate {max})")]
    OutOfRange { bbox: Bbox, zoom: u32, max: u32 },
}

/// Rectangular tile region, inclusive on all sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bbox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl fmt::Display for Bbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

impl Bbox {
    /// Parses `min_x,min_y,max_x,max_y[,src_zoom]`. A `-1` max coordinate
    /// stands for the grid edge, and a fifth element rescales the box from
    /// `src_zoom` to the requested zoom (minima floored, maxima ceiled).
    pub fn parse(s: &str, zoom: u32) -> Result<Self, BboxError> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 && parts.len() != 5 {
            return Err(BboxError::Malformed(s.to_string()));
        }

        let coord = |raw: &str| -> Result<i64, BboxError> {
            raw.trim()
                .parse()
                .map_err(|_| BboxError::Coordinate(raw.to_string()))
        };

        let mut min_x = coord(parts[0])?;
        let mut min_y = coord(parts[1])?;
        let mut max_x = coord(parts[2])?;
        let mut max_y = coord(parts[3])?;

        let src_zoom = match parts.get(4) {
            Some(&raw) => u32::try_from(coord(raw)?)
                .map_err(|_| BboxError::Coordinate(raw.to_string()))?,
            None => zoom,
        };

        // The sentinel means "grid edge" at the zoom the box was given in.
        let src_edge = (1i64 << src_zoom) - 1;
        if max_x == -1 {
            max_x = src_edge;
        }
        if max_y == -1 {
            max_y = src_edge;
        }

        if src_zoom != zoom {
            let factor = 2f64.powi(zoom as i32 - src_zoom as i32);
            min_x = (min_x as f64 * factor).floor() as i64;
            min_y = (min_y as f64 * factor).floor() as i64;
            max_x = (max_x as f64 * factor).ceil() as i64;
            max_y = (max_y as f64 * factor).ceil() as i64;
        }

        let grid_edge = (1i64 << zoom) - 1;
        if min_x < 0 || min_y < 0 || max_x > grid_edge || max_y > grid_edge {
            let clamp = |v: i64| v.clamp(0, u32::MAX as i64) as u32;
            return Err(BboxError::OutOfRange {
                bbox: Bbox {
                    min_x: clamp(min_x),
                    min_y: clamp(min_y),
                    max_x: clamp(max_x),
                    max_y: clamp(max_y),
                },
                zoom,
                max: grid_edge as u32,
            });
        }

        let bbox = Bbox {
            min_x: min_x as u32,
            min_y: min_y as u32,
            max_x: max_x as u32,
            max_y: max_y as u32,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Inverted boxes would underflow the tile mapping; reject them before
    /// any ticks are scheduled.
    pub fn validate(&self) -> Result<(), BboxError> {
        if self.max_x < self.min_x || self.max_y < self.min_y {
            return Err(BboxError::Degenerate(*self));
        }
        Ok(())
    }

    fn width(&self) -> u64 {
        u64::from(self.max_x - self.min_x) + 1
    }

    fn height(&self) -> u64 {
        u64::from(self.max_y - self.min_y) + 1
    }

    /// Maps a pseudo-random draw onto a tile inside the box. Every tile in
    /// the rectangle is reachable and equally likely for uniform draws.
    pub fn tile(&self, draw: u64) -> (u32, u32) {
        debug_assert!(self.validate().is_ok());
        let width = self.width();
        let index = draw % (width * self.height());
        let x = self.min_x + (index % width) as u32;
        let y = self.min_y + (index / width) as u32;
        (x, y)
    }
}

/// Targets random tiles of a layergroup at a fixed zoom level, bounded by a
/// bbox. The draw sequence comes from an explicitly seeded RNG, so a fixed
/// seed replays the identical tile walk.
#[derive(Debug)]
pub struct TileTargeter {
    base: String,
    hostname: String,
    layergroup: String,
    zoom: u32,
    bbox: Bbox,
    rng: Mutex<StdRng>,
}

impl TileTargeter {
    pub fn new(
        base: impl Into<String>,
        hostname: impl Into<String>,
        layergroup: impl Into<String>,
        zoom: u32,
        seed: u64,
        bbox: Bbox,
    ) -> Result<Self, BboxError> {
        bbox.validate()?;
        Ok(Self {
            base: base.into(),
            hostname: hostname.into(),
            layergroup: layergroup.into(),
            zoom,
            bbox,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }
}

impl Targeter for TileTargeter {
    fn next_target(&self) -> Result<Target, TargetError> {
        let (x, y, bust) = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            let (x, y) = self.bbox.tile(rng.random());
            (x, y, rng.random::<f64>())
        };

        let url = format!(
            "{}/api/v1/map/{}/{}/{}/{}.png?_cache_bust={}",
            self.base, self.layergroup, self.zoom, x, y, bust
        );

        // The Host header routes the request to the right tenant; the URL
        // still points at the networking host.
        Ok(Target::get(url).with_header("Host", self.hostname.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targeter(seed: u64) -> TileTargeter {
        TileTargeter::new(
            "http://127.0.0.1:8181",
            "devuser.localhost.lan",
            "0:0",
            10,
            seed,
            Bbox {
                min_x: 9,
                min_y: 17,
                max_x: 21,
                max_y: 27,
            },
        )
        .unwrap()
    }

    #[test]
    fn tile_mapping_stays_inside_the_box() {
        let bbox = Bbox {
            min_x: 157,
            min_y: 354,
            max_x: 283,
            max_y: 436,
        };

        let mut rng = StdRng::seed_from_u64(99);
        let draws = (0..10_000)
            .map(|_| rng.random())
            .chain([0, 1, u64::MAX, u64::MAX - 1]);

        for draw in draws {
            let (x, y) = bbox.tile(draw);
            assert!((bbox.min_x..=bbox.max_x).contains(&x), "x={x} from draw {draw}");
            assert!((bbox.min_y..=bbox.max_y).contains(&y), "y={y} from draw {draw}");
        }
    }

    #[test]
    fn tile_mapping_covers_every_tile() {
        let bbox = Bbox {
            min_x: 2,
            min_y: 3,
            max_x: 4,
            max_y: 5,
        };

        // Sequential draws walk the rectangle row by row.
        let tiles: Vec<(u32, u32)> = (0..9).map(|draw| bbox.tile(draw)).collect();
        assert_eq!(tiles[0], (2, 3));
        assert_eq!(tiles[2], (4, 3));
        assert_eq!(tiles[3], (2, 4));
        assert_eq!(tiles[8], (4, 5));
        // Draw 9 wraps back to the first tile.
        assert_eq!(bbox.tile(9), (2, 3));
    }

    #[test]
    fn single_tile_box_is_valid() {
        let bbox = Bbox {
            min_x: 5,
            min_y: 5,
            max_x: 5,
            max_y: 5,
        };
        assert!(bbox.validate().is_ok());
        assert_eq!(bbox.tile(12345), (5, 5));
    }

    #[test]
    fn fixed_seed_replays_identical_urls() {
        let a = targeter(1234);
        let b = targeter(1234);
        for _ in 0..32 {
            assert_eq!(
                a.next_target().unwrap().url,
                b.next_target().unwrap().url
            );
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let a = targeter(1);
        let b = targeter(2);
        let same = (0..16)
            .filter(|_| a.next_target().unwrap().url == b.next_target().unwrap().url)
            .count();
        assert!(same < 16);
    }

    #[test]
    fn sets_virtual_host_header() {
        let target = targeter(0).next_target().unwrap();
        assert_eq!(
            target.headers,
            vec![("Host".to_string(), "devuser.localhost.lan".to_string())]
        );
        assert!(target.url.starts_with("http://127.0.0.1:8181/api/v1/map/0:0/10/"));
    }

    #[test]
    fn inverted_box_is_rejected_at_construction() {
        let inverted = Bbox {
            min_x: 10,
            min_y: 0,
            max_x: 3,
            max_y: 5,
        };
        let err = TileTargeter::new("http://h", "vh", "0:0", 10, 0, inverted).unwrap_err();
        assert!(matches!(err, BboxError::Degenerate(_)));
    }

    #[test]
    fn parse_expands_edge_sentinels() {
        let bbox = Bbox::parse("0,0,-1,-1", 2).unwrap();
        assert_eq!(
            bbox,
            Bbox {
                min_x: 0,
                min_y: 0,
                max_x: 3,
                max_y: 3,
            }
        );
    }

    #[test]
    fn parse_rescales_from_source_zoom() {
        // A zoom-2 box blown up to zoom 4: every coordinate scales by 4.
        let bbox = Bbox::parse("1,1,2,3,2", 4).unwrap();
        assert_eq!(
            bbox,
            Bbox {
                min_x: 4,
                min_y: 4,
                max_x: 8,
                max_y: 12,
            }
        );
    }

    #[test]
    fn parse_sentinel_in_source_zoom_fills_target_grid() {
        let bbox = Bbox::parse("0,0,-1,-1,2", 4).unwrap();
        assert_eq!(bbox.min_x, 0);
        assert_eq!(bbox.max_x, 12);
    }

    #[test]
    fn parse_rejects_inverted_and_malformed_input() {
        assert!(matches!(
            Bbox::parse("5,0,2,4", 10),
            Err(BboxError::Degenerate(_))
        ));
        assert!(matches!(
            Bbox::parse("1,2,3", 10),
            Err(BboxError::Malformed(_))
        ));
        assert!(matches!(
            Bbox::parse("a,0,1,1", 10),
            Err(BboxError::Coordinate(_))
        ));
        assert!(matches!(
            Bbox::parse("0,0,9,9", 2),
            Err(BboxError::OutOfRange { .. })
        ));
    }
}
