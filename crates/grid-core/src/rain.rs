//! Falling-glyph rain: one drop counter per column plus a fading cell buffer.
//!
//! Each tick fades the previous frame, paints one random glyph per column at the drop's row
//! and advances every drop. Drops that have left the screen reset to the top only with a
//! small probability per tick, which staggers the columns.

use rand::Rng;

use crate::config::RainSettings;

/// Half-width katakana (single terminal cell each), Latin capitals and digits.
pub const GLYPHS: &str = "ｦｧｨｩｪｫｬｭｮｯｰｱｲｳｴｵｶｷｸｹｺｻｼｽｾｿﾀﾁﾂﾃﾄﾅﾆﾇﾈﾉﾊﾋﾌﾍﾎﾏﾐﾑﾒﾓﾔﾕﾖﾗﾘﾙﾚﾛﾜﾝ\
ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Cells dimmer than this are dropped from the buffer.
const INTENSITY_FLOOR: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainCell {
    pub glyph: char,
    /// 1.0 when freshly painted, decays towards 0.
    pub intensity: f32,
}

#[derive(Debug, Clone)]
pub struct RainField {
    width: u16,
    height: u16,
    drops: Vec<u16>,
    cells: Vec<Option<RainCell>>,
    glyphs: Vec<char>,
    fade_alpha: f32,
    reset_threshold: f64,
}

impl RainField {
    pub fn new(width: u16, height: u16, settings: &RainSettings) -> Self {
        Self {
            width,
            height,
            drops: vec![1; width as usize],
            cells: vec![None; width as usize * height as usize],
            glyphs: GLYPHS.chars().collect(),
            fade_alpha: settings.fade_alpha.clamp(0.0, 1.0),
            reset_threshold: settings.reset_threshold,
        }
    }

    /// Recompute the column count for a new viewport. Surviving columns keep their drops.
    pub fn resize(&mut self, width: u16, height: u16) {
        if width == self.width && height == self.height {
            return;
        }
        self.drops.resize(width as usize, 1);
        self.cells = vec![None; width as usize * height as usize];
        self.width = width;
        self.height = height;
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let keep = 1.0 - self.fade_alpha;
        for cell in self.cells.iter_mut() {
            *cell = cell
                .map(|c| RainCell { intensity: c.intensity * keep, ..c })
                .filter(|c| c.intensity >= INTENSITY_FLOOR);
        }

        let (width, height) = (self.width as usize, self.height);
        for x in 0..width {
            let row = self.drops[x];
            if row < height {
                let glyph = self.glyphs[rng.gen_range(0..self.glyphs.len())];
                self.cells[row as usize * width + x] = Some(RainCell { glyph, intensity: 1.0 });
            }
            if row > height && rng.gen::<f64>() > self.reset_threshold {
                self.drops[x] = 0;
            }
            self.drops[x] = self.drops[x].saturating_add(1);
        }
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<RainCell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells[y as usize * self.width as usize + x as usize]
    }

    pub fn columns(&self) -> usize {
        self.drops.len()
    }

    pub fn drops(&self) -> &[u16] {
        &self.drops
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn drops_advance_one_row_per_tick() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut field = RainField::new(10, 40, &RainSettings::default());
        for _ in 0..5 {
            field.tick(&mut rng);
        }
        assert!(field.drops().iter().all(|&d| d == 6));
        assert!(field.cell(0, 5).is_some());
    }

    #[test]
    fn drops_never_reset_while_on_screen() {
        let mut rng = StdRng::seed_from_u64(11);
        let settings = RainSettings { reset_threshold: 0.0, ..RainSettings::default() };
        let mut field = RainField::new(4, 8, &settings);
        let mut previous = field.drops().to_vec();
        for _ in 0..200 {
            field.tick(&mut rng);
            for (now, before) in field.drops().iter().zip(&previous) {
                if now < before {
                    assert!(*before > 8, "reset from row {} which is still on screen", before);
                }
            }
            previous = field.drops().to_vec();
        }
    }

    #[test]
    fn trail_fades_out() {
        let mut rng = StdRng::seed_from_u64(5);
        let settings = RainSettings { fade_alpha: 0.5, ..RainSettings::default() };
        let mut field = RainField::new(1, 50, &settings);
        field.tick(&mut rng);
        let first = field.cell(0, 1).unwrap();
        field.tick(&mut rng);
        let faded = field.cell(0, 1).unwrap();
        assert!(faded.intensity < first.intensity);
        for _ in 0..10 {
            field.tick(&mut rng);
        }
        assert!(field.cell(0, 1).is_none());
    }

    #[test]
    fn resize_recomputes_columns() {
        let mut field = RainField::new(10, 10, &RainSettings::default());
        field.resize(25, 12);
        assert_eq!(field.columns(), 25);
        assert_eq!(field.size(), (25, 12));
        assert!(field.cell(24, 11).is_none());
    }
}
