use crate::config::Config;
use crate::datasources::{CommentsSummary, ExtractedAnalysis};
use crate::error::{ReportError, Result};
use crate::logic::comments::{classify_for_comments, compose, resolve_names, CommentInputs};
use crate::logic::corrections::{plan, CorrectionPlan, CorrectionProgress};
use crate::logic::ratios::{nutritional_ratios, RatioReading};
use crate::logic::scoring::{overall_score, HealthScore};
use crate::logic::{FertilizerCatalog, RateEngine};
use crate::logic::rates::OptionFilter;
use crate::models::{
    AmendmentsSummary, FertilizerOption, MoveDirection, Nutrient, OptionPriority, PaddockInfo,
    ProgramKind, Programs, ReleaseType, ReportExport, SelectionSet, SoilProfile, TankMix,
    PRODUCT_FORMS,
};
use std::collections::HashMap;
use std::path::PathBuf;

/// Rate step for +/- on the corrections screen, kg/ha.
pub const RATE_STEP: f64 = 10.0;

/// Rate step on the programs screen, in the program's own unit.
pub const PROGRAM_RATE_STEP: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Nutrients,
    Corrections,
    Score,
    Comments,
    TankMix,
    Programs,
}

impl Screen {
    pub fn from_key(c: char) -> Option<Self> {
        match c {
            '1' => Some(Screen::Nutrients),
            '2' => Some(Screen::Corrections),
            '3' => Some(Screen::Score),
            '4' => Some(Screen::Comments),
            '5' => Some(Screen::TankMix),
            '6' => Some(Screen::Programs),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Nutrients => "Nutrients",
            Screen::Corrections => "Corrections",
            Screen::Score => "Health Score",
            Screen::Comments => "General Comments",
            Screen::TankMix => "Tank Mixing",
            Screen::Programs => "Programs",
        }
    }
}

/// Everything the report holds for one paddock.
#[derive(Debug, Clone, Default)]
pub struct PaddockReport {
    pub key: String,
    pub info: PaddockInfo,
    pub profile: SoilProfile,
    pub selections: SelectionSet,
    pub amendments: AmendmentsSummary,
    pub tank_mix: TankMix,
    pub programs: Programs,
}

impl PaddockReport {
    pub fn new(analysis: ExtractedAnalysis) -> Self {
        Self {
            key: analysis.key,
            info: analysis.info,
            profile: analysis.profile,
            ..Default::default()
        }
    }

    pub fn display_name(&self) -> String {
        self.info.display_name(&self.key)
    }

    pub fn corrections(&self) -> CorrectionPlan<'_> {
        plan(&self.profile)
    }

    pub fn health(&self) -> HealthScore {
        overall_score(&self.profile.nutrients)
    }

    pub fn ratios(&self) -> Vec<RatioReading> {
        nutritional_ratios(&self.profile)
    }

    pub fn comment_inputs(&self) -> CommentInputs {
        classify_for_comments(&self.profile.nutrients)
    }

    /// Template paragraphs only, for when no summary is available.
    pub fn template_comments(&self) -> String {
        let inputs = self.comment_inputs();
        compose("", &inputs.deficient_elements(), &inputs.excess_elements())
    }

    /// Add `fert_label` under `target` in a new selector at its capped rate.
    /// Returns the applied rate, or `None` for unknown labels and targets.
    pub fn add_at_capped_rate(
        &mut self,
        engine: &RateEngine<'_>,
        target: &Nutrient,
        fert_label: &str,
    ) -> Option<f64> {
        let slot = self.selections.slot_count(&target.name);
        let capped = engine.recommend(target, fert_label, &self.selections, slot, &self.profile)?;
        engine
            .apply(
                &mut self.selections,
                &mut self.amendments,
                target,
                slot,
                fert_label,
                capped.rate,
            )
            .then_some(capped.rate)
    }

    /// Select the best safe product for every correction that has no
    /// selection yet. Returns the number of products added.
    pub fn auto_select(&mut self, engine: &RateEngine<'_>) -> usize {
        let targets: Vec<Nutrient> = self.corrections().all().cloned().collect();
        let mut added = 0;
        for target in targets {
            if self.selections.slot_count(&target.name) > 0 {
                continue;
            }
            let best = engine
                .ranked_options(&target, &self.profile, &self.selections, &OptionFilter::default())
                .into_iter()
                .find(|o| {
                    matches!(o.priority, OptionPriority::PhCompatible | OptionPriority::Safe)
                        && o.rate() > 0.0
                });
            if let Some(option) = best {
                if self.add_at_capped_rate(engine, &target, &option.label).is_some() {
                    added += 1;
                }
            }
        }
        added
    }

    pub fn to_export(&self, config: &Config, general_comments: &str) -> ReportExport {
        ReportExport {
            generated_at: chrono::Utc::now(),
            paddock: self.info.clone(),
            nutrients: self.profile.nutrients.clone(),
            ratios: self.ratios(),
            recommendations: self.amendments.entries().to_vec(),
            nutrient_totals: self.amendments.totals(),
            tank_mixing: self.tank_mix.items().to_vec(),
            seed_treatment: self.programs.seed_treatment.items().to_vec(),
            soil_drench: self.programs.soil_drench.items().to_vec(),
            foliar_spray: self.programs.foliar_spray.items().to_vec(),
            plant_health_score: self.health(),
            agronomist: config.agronomist.clone(),
            general_comments: general_comments.to_string(),
        }
    }
}

pub struct NutrientsState {
    pub selected_index: usize,
}

impl NutrientsState {
    pub fn new() -> Self {
        Self { selected_index: 0 }
    }

    pub fn next(&mut self, max: usize) {
        if max > 0 && self.selected_index < max - 1 {
            self.selected_index += 1;
        }
    }

    pub fn prev(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionsFocus {
    Deficiencies,
    Options,
}

pub struct CorrectionsState {
    pub selected_correction: usize,
    pub selected_option: usize,
    pub focus: CorrectionsFocus,
    pub filter: OptionFilter,
    pub searching: bool,
}

impl CorrectionsState {
    pub fn new() -> Self {
        Self {
            selected_correction: 0,
            selected_option: 0,
            focus: CorrectionsFocus::Deficiencies,
            filter: OptionFilter::default(),
            searching: false,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            CorrectionsFocus::Deficiencies => CorrectionsFocus::Options,
            CorrectionsFocus::Options => CorrectionsFocus::Deficiencies,
        };
    }

    pub fn next(&mut self, max: usize) {
        let index = match self.focus {
            CorrectionsFocus::Deficiencies => &mut self.selected_correction,
            CorrectionsFocus::Options => &mut self.selected_option,
        };
        if max > 0 && *index < max - 1 {
            *index += 1;
        }
        if self.focus == CorrectionsFocus::Deficiencies {
            self.selected_option = 0;
        }
    }

    pub fn prev(&mut self) {
        let index = match self.focus {
            CorrectionsFocus::Deficiencies => &mut self.selected_correction,
            CorrectionsFocus::Options => &mut self.selected_option,
        };
        if *index > 0 {
            *index -= 1;
        }
        if self.focus == CorrectionsFocus::Deficiencies {
            self.selected_option = 0;
        }
    }

    pub fn cycle_release(&mut self) {
        self.filter.release = ReleaseType::next_filter(self.filter.release);
        self.selected_option = 0;
    }
}

pub struct CommentsState {
    pub scroll: u16,
}

impl CommentsState {
    pub fn new() -> Self {
        Self { scroll: 0 }
    }
}

pub struct TankMixState {
    pub selected_index: usize,
}

impl TankMixState {
    pub fn new() -> Self {
        Self { selected_index: 0 }
    }
}

/// Draft product on the programs screen plus the highlighted item.
pub struct ProgramsState {
    pub kind: ProgramKind,
    pub selected_item: usize,
    pub product_index: usize,
    pub unit_index: usize,
    pub rate: f64,
}

impl ProgramsState {
    pub fn new() -> Self {
        Self {
            kind: ProgramKind::SeedTreatment,
            selected_item: 0,
            product_index: 0,
            unit_index: 0,
            rate: 1.0,
        }
    }

    pub fn cycle_kind(&mut self) {
        self.kind = self.kind.next();
        self.selected_item = 0;
        self.unit_index = 0;
    }

    pub fn unit(&self) -> &'static str {
        let units = self.kind.units();
        units[self.unit_index % units.len()]
    }

    pub fn cycle_unit(&mut self) {
        self.unit_index = (self.unit_index + 1) % self.kind.units().len();
    }

    pub fn step_product(&mut self, forward: bool, count: usize) {
        if count == 0 {
            return;
        }
        self.product_index = if forward {
            (self.product_index + 1) % count
        } else {
            (self.product_index + count - 1) % count
        };
    }

    pub fn adjust_rate(&mut self, delta: f64) {
        self.rate = (self.rate + delta).max(PROGRAM_RATE_STEP);
    }
}

pub struct App {
    pub screen: Screen,
    pub should_quit: bool,
    pub config: Config,
    pub catalog: FertilizerCatalog,

    // Report
    pub paddocks: Vec<PaddockReport>,
    pub current: usize,
    pub general_comments: HashMap<String, String>,

    // Screen states
    pub nutrients_state: NutrientsState,
    pub corrections_state: CorrectionsState,
    pub comments_state: CommentsState,
    pub tank_mix_state: TankMixState,
    pub programs_state: ProgramsState,

    // UI state
    pub status_message: Option<String>,
    pub extracting: bool,
    pub needs_comments: bool,
    pub pdf_input: Option<String>,
    pub pending_pdf: Option<PathBuf>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            screen: Screen::Nutrients,
            should_quit: false,
            config,
            catalog: FertilizerCatalog::standard(),
            paddocks: Vec::new(),
            current: 0,
            general_comments: HashMap::new(),
            nutrients_state: NutrientsState::new(),
            corrections_state: CorrectionsState::new(),
            comments_state: CommentsState::new(),
            tank_mix_state: TankMixState::new(),
            programs_state: ProgramsState::new(),
            status_message: None,
            extracting: false,
            needs_comments: false,
            pdf_input: None,
            pending_pdf: None,
        }
    }

    pub fn switch_screen(&mut self, screen: Screen) {
        self.screen = screen;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn set_status(&mut self, message: &str) {
        self.status_message = Some(message.to_string());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    /// True while a text field has the keyboard.
    pub fn is_editing(&self) -> bool {
        self.corrections_state.searching || self.pdf_input.is_some()
    }

    pub fn engine(&self) -> RateEngine<'_> {
        RateEngine::new(&self.catalog, self.config.agronomy.max_excess_percent())
    }

    pub fn paddock(&self) -> Option<&PaddockReport> {
        self.paddocks.get(self.current)
    }

    pub fn load_analyses(&mut self, analyses: Vec<ExtractedAnalysis>) {
        self.paddocks = analyses.into_iter().map(PaddockReport::new).collect();
        self.current = 0;
        self.general_comments.clear();
        self.reset_screen_states();
        tracing::info!("Loaded {} paddocks", self.paddocks.len());
        let names: Vec<String> = self.paddocks.iter().map(|p| p.display_name()).collect();
        self.set_status(&format!("Loaded {}", names.join(", ")));
    }

    fn reset_screen_states(&mut self) {
        self.nutrients_state = NutrientsState::new();
        self.corrections_state = CorrectionsState::new();
        self.comments_state = CommentsState::new();
        self.tank_mix_state = TankMixState::new();
        self.programs_state = ProgramsState::new();
    }

    pub fn next_paddock(&mut self) {
        if self.current + 1 < self.paddocks.len() {
            self.current += 1;
            self.reset_screen_states();
        }
    }

    pub fn prev_paddock(&mut self) {
        if self.current > 0 {
            self.current -= 1;
            self.reset_screen_states();
        }
    }

    /// Claim the extraction slot. A second upload while one is pending is refused.
    pub fn begin_extraction(&mut self) -> Result<()> {
        if self.extracting {
            return Err(ReportError::Busy("An extraction is already in progress".into()));
        }
        self.extracting = true;
        self.set_status("Extracting report...");
        Ok(())
    }

    pub fn start_pdf_input(&mut self) {
        self.pdf_input = Some(String::new());
    }

    pub fn cancel_pdf_input(&mut self) {
        self.pdf_input = None;
    }

    /// Queue the typed path for upload.
    pub fn submit_pdf_input(&mut self) {
        let Some(input) = self.pdf_input.take() else {
            return;
        };
        let path = input.trim();
        if path.is_empty() {
            return;
        }
        match self.begin_extraction() {
            Ok(()) => self.pending_pdf = Some(PathBuf::from(path)),
            Err(e) => self.set_status(&e.to_string()),
        }
    }

    pub fn finish_extraction(&mut self, result: Result<Vec<ExtractedAnalysis>>) {
        self.extracting = false;
        match result {
            Ok(analyses) => self.load_analyses(analyses),
            Err(e) => {
                tracing::warn!("Extraction failed: {}", e);
                self.set_status("Failed to parse PDF. Please check the file and try again.");
            }
        }
    }

    fn correction_target(&self) -> Option<Nutrient> {
        self.paddock()?
            .corrections()
            .get(self.corrections_state.selected_correction)
            .cloned()
    }

    /// Ranked options for the highlighted correction.
    pub fn current_options(&self) -> Vec<FertilizerOption> {
        let (Some(paddock), Some(target)) = (self.paddock(), self.correction_target()) else {
            return Vec::new();
        };
        self.engine().ranked_options(
            &target,
            &paddock.profile,
            &paddock.selections,
            &self.corrections_state.filter,
        )
    }

    pub fn current_progress(&self) -> Option<CorrectionProgress> {
        let paddock = self.paddock()?;
        let target = self.correction_target()?;
        CorrectionProgress::compute_with_band(
            &self.engine(),
            &paddock.selections,
            &target,
            self.config.agronomy.progress_band_percent,
        )
    }

    /// Add the highlighted option at its capped rate.
    pub fn add_selected_option(&mut self) {
        let Some(target) = self.correction_target() else {
            return;
        };
        let Some(option) = self
            .current_options()
            .into_iter()
            .nth(self.corrections_state.selected_option)
        else {
            return;
        };

        let engine = RateEngine::new(&self.catalog, self.config.agronomy.max_excess_percent());
        let Some(paddock) = self.paddocks.get_mut(self.current) else {
            return;
        };
        let message = match paddock.add_at_capped_rate(&engine, &target, &option.label) {
            Some(rate) if rate > 0.0 => format!("Added {} at {:.1} kg/ha", option.label, rate),
            Some(_) => format!("Added {} with no safe rate", option.label),
            None => format!("{} is not in the catalog", option.label),
        };
        self.set_status(&message);
    }

    /// Step the newest selection of the highlighted correction. Increases that
    /// would push any nutrient past the excess limit are refused.
    pub fn adjust_last_rate(&mut self, delta: f64) {
        let Some(target) = self.correction_target() else {
            return;
        };
        let engine = RateEngine::new(&self.catalog, self.config.agronomy.max_excess_percent());
        let Some(paddock) = self.paddocks.get_mut(self.current) else {
            return;
        };
        let Some((slot, selection)) = paddock.selections.for_nutrient(&target.name).last() else {
            self.set_status("No product selected for this nutrient");
            return;
        };
        let label = selection.fert_label.clone();
        let rate = (selection.rate + delta).max(0.0);

        if delta > 0.0 {
            if let Some(exceedance) = engine.would_exceed(
                &label,
                rate,
                &target,
                slot,
                &paddock.profile,
                &paddock.selections,
            ) {
                self.set_status(&format!("Rate blocked: {}", exceedance));
                return;
            }
        }

        engine.apply(
            &mut paddock.selections,
            &mut paddock.amendments,
            &target,
            slot,
            &label,
            rate,
        );
        self.set_status(&format!("{} set to {:.1} kg/ha", label, rate));
    }

    pub fn remove_last_selection(&mut self) {
        let Some(target) = self.correction_target() else {
            return;
        };
        let engine = RateEngine::new(&self.catalog, self.config.agronomy.max_excess_percent());
        let Some(paddock) = self.paddocks.get_mut(self.current) else {
            return;
        };
        let Some(slot) = paddock
            .selections
            .for_nutrient(&target.name)
            .last()
            .map(|(slot, _)| slot)
        else {
            return;
        };
        if let Some(removed) = engine.remove(&mut paddock.selections, &mut paddock.amendments, &target, slot) {
            self.set_status(&format!("Removed {}", removed.fert_label));
        }
    }

    pub fn current_comments(&self) -> Option<&str> {
        let paddock = self.paddock()?;
        self.general_comments.get(&paddock.key).map(String::as_str)
    }

    pub fn request_comments(&mut self) {
        if self.paddock().is_some() {
            self.needs_comments = true;
            self.set_status("Generating comments...");
        }
    }

    /// Cache composed comments for the current paddock.
    pub fn apply_comments(&mut self, result: Result<CommentsSummary>) {
        let Some(paddock) = self.paddock() else {
            return;
        };
        let key = paddock.key.clone();
        let text = match result {
            Ok(summary) => {
                let deficient = resolve_names(&summary.deficient);
                let excess = resolve_names(&summary.excess);
                self.clear_status();
                compose(&summary.summary, &deficient, &excess)
            }
            Err(e) => {
                tracing::warn!("Comments service failed: {}", e);
                let fallback = paddock.template_comments();
                self.set_status("Error contacting AI service.");
                fallback
            }
        };
        self.general_comments.insert(key, text);
        self.comments_state.scroll = 0;
    }

    /// Append the next standard product form to the tank mix.
    pub fn add_mixing_step(&mut self) {
        let Some(paddock) = self.paddocks.get_mut(self.current) else {
            return;
        };
        let (description, _) = PRODUCT_FORMS[paddock.tank_mix.len() % PRODUCT_FORMS.len()];
        paddock.tank_mix.add(description);
        self.tank_mix_state.selected_index = paddock.tank_mix.len() - 1;
    }

    fn selected_step_id(&self) -> Option<u32> {
        self.paddock()?
            .tank_mix
            .items()
            .get(self.tank_mix_state.selected_index)
            .map(|i| i.id)
    }

    pub fn remove_mixing_step(&mut self) {
        let Some(id) = self.selected_step_id() else {
            return;
        };
        if let Some(paddock) = self.paddocks.get_mut(self.current) {
            paddock.tank_mix.remove(id);
            let len = paddock.tank_mix.len();
            if self.tank_mix_state.selected_index >= len {
                self.tank_mix_state.selected_index = len.saturating_sub(1);
            }
        }
    }

    pub fn move_mixing_step(&mut self, direction: MoveDirection) {
        let Some(id) = self.selected_step_id() else {
            return;
        };
        if let Some(paddock) = self.paddocks.get_mut(self.current) {
            if paddock.tank_mix.move_item(id, direction) {
                self.tank_mix_state.selected_index = match direction {
                    MoveDirection::Up => self.tank_mix_state.selected_index - 1,
                    MoveDirection::Down => self.tank_mix_state.selected_index + 1,
                };
            }
        }
    }

    /// Cycle the highlighted step through the standard product forms.
    pub fn cycle_step_description(&mut self) {
        let Some(id) = self.selected_step_id() else {
            return;
        };
        let Some(paddock) = self.paddocks.get_mut(self.current) else {
            return;
        };
        let Some(item) = paddock.tank_mix.items().iter().find(|i| i.id == id) else {
            return;
        };
        let next = PRODUCT_FORMS
            .iter()
            .position(|(d, _)| *d == item.product_description)
            .map_or(0, |i| (i + 1) % PRODUCT_FORMS.len());
        paddock.tank_mix.set_description(id, PRODUCT_FORMS[next].0);
    }

    /// Put the first selected product not yet in the mix into the highlighted step.
    pub fn assign_next_product(&mut self) {
        let Some(id) = self.selected_step_id() else {
            return;
        };
        let Some(paddock) = self.paddocks.get_mut(self.current) else {
            return;
        };
        let assigned: Vec<String> = paddock
            .tank_mix
            .items()
            .iter()
            .flat_map(|i| i.products.iter().cloned())
            .collect();
        let next = paddock
            .amendments
            .entries()
            .iter()
            .map(|e| e.fertilizer.clone())
            .find(|f| !assigned.contains(f));
        match next {
            Some(product) => {
                paddock.tank_mix.assign_product(id, &product);
                self.set_status(&format!("Added {} to step", product));
            }
            None => self.set_status("Every selected product is already in the mix"),
        }
    }

    /// Catalog label currently offered on the programs screen.
    pub fn draft_program_product(&self) -> Option<&str> {
        self.catalog
            .all()
            .get(self.programs_state.product_index)
            .map(|d| d.label.as_str())
    }

    /// Add `product` to a program of the current paddock. Catalog products
    /// carry their nutrient content; other names are kept without it.
    pub fn add_program_item(
        &mut self,
        kind: ProgramKind,
        product: &str,
        rate: f64,
        unit: &str,
    ) -> Option<u32> {
        let content = self
            .catalog
            .get(product)
            .map(|d| d.nutrient_content.clone())
            .unwrap_or_default();
        let paddock = self.paddocks.get_mut(self.current)?;
        let id = paddock.programs.get_mut(kind).add(product, rate, unit, content);
        match id {
            Some(_) => self.set_status(&format!(
                "Added {} at {} {} to {}",
                product,
                rate,
                unit,
                kind.title()
            )),
            None => self.set_status("Choose a product, a positive rate and a unit"),
        }
        id
    }

    pub fn remove_program_item(&mut self, kind: ProgramKind, id: u32) -> bool {
        let Some(paddock) = self.paddocks.get_mut(self.current) else {
            return false;
        };
        paddock.programs.get_mut(kind).remove(id)
    }

    /// Add the draft product to the program on screen.
    pub fn add_draft_program_item(&mut self) {
        let Some(product) = self.draft_program_product().map(str::to_string) else {
            return;
        };
        let state = &self.programs_state;
        let (kind, rate, unit) = (state.kind, state.rate, state.unit());
        if self.add_program_item(kind, &product, rate, unit).is_some() {
            let len = self.paddock().map_or(0, |p| p.programs.get(kind).len());
            self.programs_state.selected_item = len.saturating_sub(1);
        }
    }

    pub fn remove_selected_program_item(&mut self) {
        let kind = self.programs_state.kind;
        let Some(id) = self.paddock().and_then(|p| {
            p.programs
                .get(kind)
                .items()
                .get(self.programs_state.selected_item)
                .map(|i| i.id)
        }) else {
            return;
        };
        if self.remove_program_item(kind, id) {
            let len = self.paddock().map_or(0, |p| p.programs.get(kind).len());
            if self.programs_state.selected_item >= len {
                self.programs_state.selected_item = len.saturating_sub(1);
            }
        }
    }

    /// Write the current paddock's export next to the working directory.
    pub fn export_to_file(&mut self) {
        let Some(export) = self.export() else {
            return;
        };
        let Some(key) = self.paddock().map(|p| p.key.clone()) else {
            return;
        };
        let path = export_file_name(&key);
        let written = export
            .to_json()
            .and_then(|json| std::fs::write(&path, json).map_err(ReportError::from));
        match written {
            Ok(()) => self.set_status(&format!("Exported to {}", path)),
            Err(e) => {
                tracing::warn!("Export failed: {}", e);
                self.set_status(&format!("Export failed: {}", e));
            }
        }
    }

    pub fn export(&self) -> Option<ReportExport> {
        let paddock = self.paddock()?;
        let comments = self
            .current_comments()
            .map(str::to_string)
            .unwrap_or_else(|| paddock.template_comments());
        Some(paddock.to_export(&self.config, &comments))
    }
}

/// `North Paddock` -> `north-paddock-report.json`
pub fn export_file_name(key: &str) -> String {
    let mut slug = String::new();
    for c in key.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "report.json".to_string()
    } else {
        format!("{}-report.json", slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasources::CommentSource;
    use crate::models::{Element, StatusThresholds};

    fn analysis(key: &str) -> ExtractedAnalysis {
        ExtractedAnalysis {
            key: key.to_string(),
            info: PaddockInfo::default(),
            profile: SoilProfile::new(vec![
                Nutrient::new("Calcium (Mehlich III)", 949.0, 1520.5, "ppm"),
                Nutrient::new("Magnesium (Mehlich III)", 150.0, 214.5, "ppm"),
                Nutrient::new("Potassium (Mehlich III)", 300.0, 200.0, "ppm"),
                Nutrient::new("pH-level (1:5 water)", 6.4, 6.5, ""),
            ]),
        }
    }

    fn app() -> App {
        let mut app = App::new(Config::default());
        app.load_analyses(vec![analysis("North"), analysis("South")]);
        app
    }

    #[test]
    fn extraction_guard_refuses_second_upload() {
        let mut app = App::new(Config::default());
        assert!(app.begin_extraction().is_ok());
        assert!(matches!(app.begin_extraction(), Err(ReportError::Busy(_))));

        app.finish_extraction(Err(ReportError::DataSourceUnavailable("down".into())));
        assert!(!app.extracting);
        assert_eq!(
            app.status_message.as_deref(),
            Some("Failed to parse PDF. Please check the file and try again.")
        );
        assert!(app.begin_extraction().is_ok());
    }

    #[test]
    fn pdf_prompt_queues_upload() {
        let mut app = App::new(Config::default());
        app.start_pdf_input();
        assert!(app.is_editing());
        app.pdf_input.as_mut().unwrap().push_str(" report.pdf ");
        app.submit_pdf_input();
        assert!(!app.is_editing());
        assert!(app.extracting);
        assert_eq!(app.pending_pdf, Some(PathBuf::from("report.pdf")));

        app.start_pdf_input();
        app.pdf_input.as_mut().unwrap().push_str("other.pdf");
        app.submit_pdf_input();
        assert_eq!(app.status_message.as_deref(), Some("Busy: An extraction is already in progress"));
    }

    #[test]
    fn adding_option_updates_selections_and_summary() {
        let mut app = app();
        let options = app.current_options();
        assert!(!options.is_empty());
        assert_eq!(options[0].target, Element::Calcium);

        app.add_selected_option();
        let paddock = app.paddock().unwrap();
        assert_eq!(paddock.selections.slot_count("Calcium (Mehlich III)"), 1);
        assert_eq!(paddock.amendments.len(), 1);

        let progress = app.current_progress().unwrap();
        assert!(progress.new_level > progress.current);
    }

    #[test]
    fn rate_adjustment_and_removal() {
        let mut app = app();
        app.add_selected_option();
        let before = app.paddock().unwrap().selections.iter().next().unwrap().rate;

        app.adjust_last_rate(-RATE_STEP);
        let after = app.paddock().unwrap().selections.iter().next().unwrap().rate;
        assert!((before - after - RATE_STEP).abs() < 1e-9 || after == 0.0);

        app.remove_last_selection();
        let paddock = app.paddock().unwrap();
        assert!(paddock.selections.is_empty());
        assert!(paddock.amendments.is_empty());
    }

    #[test]
    fn comments_are_cached_per_paddock() {
        let mut app = app();
        app.apply_comments(Ok(CommentsSummary {
            summary: "North is short of **calcium**.".into(),
            deficient: vec!["Calcium".into()],
            excess: vec![],
            closest_key: None,
            source: CommentSource::Generated,
        }));
        assert!(app.current_comments().unwrap().starts_with("North is short of calcium."));

        app.next_paddock();
        assert!(app.current_comments().is_none());
        app.apply_comments(Err(ReportError::DataSourceUnavailable("down".into())));
        assert_eq!(app.status_message.as_deref(), Some("Error contacting AI service."));
        assert!(app.current_comments().is_some());

        app.prev_paddock();
        assert!(app.current_comments().unwrap().starts_with("North"));
    }

    #[test]
    fn tank_mix_steps_follow_selection() {
        let mut app = app();
        app.add_mixing_step();
        app.add_mixing_step();
        assert_eq!(app.tank_mix_state.selected_index, 1);

        app.move_mixing_step(MoveDirection::Up);
        assert_eq!(app.tank_mix_state.selected_index, 0);
        let first = &app.paddock().unwrap().tank_mix.items()[0];
        assert_eq!(first.product_description, "Liquid Solutions");

        app.remove_mixing_step();
        assert_eq!(app.paddock().unwrap().tank_mix.len(), 1);
        assert_eq!(app.paddock().unwrap().tank_mix.items()[0].sequence, 1);
    }

    #[test]
    fn auto_select_and_export() {
        let mut paddock = PaddockReport::new(analysis("North"));
        let catalog = FertilizerCatalog::standard();
        let engine = RateEngine::new(&catalog, 25.0);
        assert!(paddock.auto_select(&engine) >= 1);
        assert_eq!(paddock.auto_select(&engine), 0);

        let export = paddock.to_export(&Config::default(), "");
        assert_eq!(export.nutrients.len(), 4);
        assert!(!export.recommendations.is_empty());
        assert!(!export.nutrient_totals.is_empty());
        for (nutrient, total) in &export.nutrient_totals {
            let supplied: f64 = export
                .recommendations
                .iter()
                .filter(|r| &r.nutrient == nutrient)
                .map(|r| r.actual_nutrient_applied)
                .sum();
            assert!((total.total - supplied).abs() < 1e-9);
        }
        assert_eq!(export.ratios.len(), 6);
    }

    #[test]
    fn programs_are_kept_per_paddock_and_exported() {
        let mut app = app();
        let id = app
            .add_program_item(ProgramKind::SoilDrench, "Super Fine Ag Lime", 2.0, "kg/ha")
            .unwrap();
        let item = &app.paddock().unwrap().programs.soil_drench.items()[0];
        assert_eq!(item.nutrient_content.get(&Element::Calcium), Some(&40.0));

        assert!(app
            .add_program_item(ProgramKind::FoliarSpray, "Cloak Spray Oil", 1.0, "L/ha")
            .is_some());
        assert!(app
            .add_program_item(ProgramKind::FoliarSpray, "Cloak Spray Oil", 1.0, "L/tonne of seed")
            .is_none());

        let export = app.export().unwrap();
        assert_eq!(export.soil_drench.len(), 1);
        assert_eq!(export.foliar_spray.len(), 1);
        assert!(export.foliar_spray[0].nutrient_content.is_empty());
        assert!(export.seed_treatment.is_empty());

        app.next_paddock();
        assert!(app.export().unwrap().soil_drench.is_empty());
        app.prev_paddock();
        assert!(app.remove_program_item(ProgramKind::SoilDrench, id));
        assert!(app.paddock().unwrap().programs.soil_drench.is_empty());
    }

    #[test]
    fn programs_screen_draft_adds_and_removes() {
        let mut app = app();
        app.programs_state.cycle_kind();
        assert_eq!(app.programs_state.kind, ProgramKind::SoilDrench);
        app.programs_state.adjust_rate(-10.0);
        assert_eq!(app.programs_state.rate, PROGRAM_RATE_STEP);
        app.programs_state.cycle_unit();
        assert_eq!(app.programs_state.unit(), "ml/ha");

        let count = app.catalog.len();
        app.programs_state.step_product(false, count);
        assert_eq!(app.programs_state.product_index, count - 1);
        let product = app.draft_program_product().unwrap().to_string();

        app.add_draft_program_item();
        let drench = &app.paddock().unwrap().programs.soil_drench;
        assert_eq!(drench.items()[0].product, product);
        assert_eq!(drench.items()[0].unit, "ml/ha");

        app.remove_selected_program_item();
        assert!(app.paddock().unwrap().programs.soil_drench.is_empty());
    }

    #[test]
    fn export_file_names() {
        assert_eq!(export_file_name("North Paddock"), "north-paddock-report.json");
        assert_eq!(export_file_name("Block 7 / East"), "block-7-east-report.json");
        assert_eq!(export_file_name("  "), "report.json");
    }

    #[test]
    fn wide_thresholds_flow_from_config() {
        let mut config = Config::default();
        config.agronomy.status_thresholds = StatusThresholds::WIDE;
        let app = App::new(config);
        assert_eq!(app.config.agronomy.status_thresholds.low, 0.75);
        assert_eq!(app.engine().max_excess_percent(), 25.0);
    }
}
