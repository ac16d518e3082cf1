use serde::{Deserialize, Serialize};

/// Standard product forms, in the order they go into the tank, with mixing notes.
pub const PRODUCT_FORMS: &[(&str, &str)] = &[
    (
        "More soluble Solids",
        "May require several minutes of good agitation",
    ),
    (
        "Liquid Solutions",
        "Make sure previous inputs are fully dissolved before adding.",
    ),
    (
        "MMS (Micronized Mineral Solutions)",
        "Pre-mix well before adding slowly to the tank under constant agitation. Maintain constant agitation to prevent settling.",
    ),
    (
        "Spray Oil",
        "Spreader/sticker/penetrant. Essential for success of foliar sprays.",
    ),
    (
        "Microbial Products",
        "Always add microbes to the spray tank last after the other ingredients have been diluted.",
    ),
];

pub fn notes_for(description: &str) -> Option<&'static str> {
    PRODUCT_FORMS
        .iter()
        .find(|(d, _)| *d == description)
        .map(|(_, notes)| *notes)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixingItem {
    pub id: u32,
    pub sequence: u32,
    pub product_description: String,
    pub products: Vec<String>,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Ordered foliar tank mixing steps. Sequence numbers are always 1..=n.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TankMix {
    items: Vec<MixingItem>,
    #[serde(skip)]
    next_id: u32,
}

impl TankMix {
    pub fn new() -> Self {
        Self::default()
    }

    fn resequence(&mut self) {
        for (idx, item) in self.items.iter_mut().enumerate() {
            item.sequence = idx as u32 + 1;
        }
    }

    pub fn items(&self) -> &[MixingItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a step; the standard note is filled in for known descriptions.
    pub fn add(&mut self, description: &str) -> u32 {
        self.next_id = self
            .next_id
            .max(self.items.iter().map(|i| i.id).max().unwrap_or(0))
            + 1;
        let id = self.next_id;
        self.items.push(MixingItem {
            id,
            sequence: 0,
            product_description: description.to_string(),
            products: Vec::new(),
            notes: notes_for(description).unwrap_or_default().to_string(),
        });
        self.resequence();
        id
    }

    pub fn remove(&mut self, id: u32) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.resequence();
        self.items.len() != before
    }

    pub fn move_item(&mut self, id: u32, direction: MoveDirection) -> bool {
        let Some(idx) = self.items.iter().position(|i| i.id == id) else {
            return false;
        };
        let target = match direction {
            MoveDirection::Up if idx > 0 => idx - 1,
            MoveDirection::Down if idx + 1 < self.items.len() => idx + 1,
            _ => return false,
        };
        self.items.swap(idx, target);
        self.resequence();
        true
    }

    pub fn set_description(&mut self, id: u32, description: &str) -> bool {
        let Some(item) = self.items.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        item.product_description = description.to_string();
        if let Some(notes) = notes_for(description) {
            item.notes = notes.to_string();
        }
        true
    }

    pub fn set_notes(&mut self, id: u32, notes: &str) -> bool {
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.notes = notes.to_string();
                true
            }
            None => false,
        }
    }

    /// Assign a product to a step. A product belongs to at most one step.
    pub fn assign_product(&mut self, id: u32, product: &str) -> bool {
        if !self.items.iter().any(|i| i.id == id) {
            return false;
        }
        if self
            .items
            .iter()
            .any(|i| i.id != id && i.products.iter().any(|p| p == product))
        {
            return false;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            if !item.products.iter().any(|p| p == product) {
                item.products.push(product.to_string());
            }
        }
        true
    }

    pub fn unassign_product(&mut self, id: u32, product: &str) -> bool {
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                let before = item.products.len();
                item.products.retain(|p| p != product);
                item.products.len() != before
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequences(mix: &TankMix) -> Vec<u32> {
        mix.items().iter().map(|i| i.sequence).collect()
    }

    #[test]
    fn add_fills_standard_notes() {
        let mut mix = TankMix::new();
        let id = mix.add("Spray Oil");
        assert_eq!(mix.items()[0].id, id);
        assert!(mix.items()[0].notes.starts_with("Spreader/sticker"));

        mix.add("Custom blend");
        assert_eq!(mix.items()[1].notes, "");
    }

    #[test]
    fn resequences_after_every_mutation() {
        let mut mix = TankMix::new();
        let a = mix.add("More soluble Solids");
        let b = mix.add("Liquid Solutions");
        let c = mix.add("Microbial Products");
        assert_eq!(sequences(&mix), vec![1, 2, 3]);

        assert!(mix.move_item(c, MoveDirection::Up));
        assert_eq!(mix.items()[1].id, c);
        assert_eq!(sequences(&mix), vec![1, 2, 3]);

        assert!(!mix.move_item(a, MoveDirection::Up));
        assert!(mix.remove(a));
        assert_eq!(sequences(&mix), vec![1, 2]);
        assert_eq!(mix.items()[1].id, b);

        assert!(!mix.remove(a));
        let d = mix.add("Spray Oil");
        assert_ne!(d, a);
        assert_eq!(sequences(&mix), vec![1, 2, 3]);
    }

    #[test]
    fn description_change_updates_notes() {
        let mut mix = TankMix::new();
        let id = mix.add("");
        assert!(mix.set_description(id, "Liquid Solutions"));
        assert_eq!(
            mix.items()[0].notes,
            "Make sure previous inputs are fully dissolved before adding."
        );
        assert!(mix.set_notes(id, "Jar test first"));
        assert_eq!(mix.items()[0].notes, "Jar test first");
    }

    #[test]
    fn product_belongs_to_one_step() {
        let mut mix = TankMix::new();
        let a = mix.add("Liquid Solutions");
        let b = mix.add("Spray Oil");
        assert!(mix.assign_product(a, "Calcium Nitrate"));
        assert!(mix.assign_product(a, "Calcium Nitrate"));
        assert_eq!(mix.items()[0].products.len(), 1);
        assert!(!mix.assign_product(b, "Calcium Nitrate"));

        assert!(mix.unassign_product(a, "Calcium Nitrate"));
        assert!(mix.assign_product(b, "Calcium Nitrate"));
    }
}
