//! Terminal rendering of runs and share links.

use crate::{
    codec,
    models::{GenerationConfig, ImageSet},
    pipeline::{persist, RunReport},
};
use colored::*;
use std::io::{self, IsTerminal, Write};
use std::path::Path;

/// File name offered when a single cover is downloaded on its own.
pub fn download_file_name(title: &str, number: usize) -> String {
    format!("{}_cover_{}.png", persist::title_dir_name(title), number)
}

/// The share link is worth showing once the configuration is no longer the
/// stock one, or when it came from a link in the first place.
pub fn should_offer_share(current: &GenerationConfig, loaded_from_link: bool) -> bool {
    loaded_from_link || current.differs_from(&GenerationConfig::default())
}

pub struct Presenter<W: Write> {
    out: W,
    colors: bool,
}

impl Presenter<io::Stdout> {
    /// Colors only when stdout is a terminal, so redirected output stays plain.
    pub fn stdout() -> Self {
        let stdout = io::stdout();
        let colors = stdout.is_terminal();
        Self::new(stdout, colors)
    }
}

impl<W: Write> Presenter<W> {
    pub fn new(out: W, colors: bool) -> Self {
        Self { out, colors }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.colors {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn announce(&mut self, config: &GenerationConfig) -> io::Result<()> {
        writeln!(
            self.out,
            "Generating covers for {} book(s):",
            config.book_titles.len()
        )?;
        for title in &config.book_titles {
            writeln!(self.out, "- {}", title)?;
        }
        if config.uses_custom_prompt() {
            let notice = self.paint("Using custom description generation prompt.", |s| s.cyan());
            writeln!(self.out, "{}", notice)?;
        }
        Ok(())
    }

    pub fn report(&mut self, report: &RunReport) -> io::Result<()> {
        for warning in &report.warnings {
            let line = self.paint(&format!("⚠️  {}", warning), |s| s.yellow());
            writeln!(self.out, "{}", line)?;
        }

        let saved = format!(
            "✅ All images saved to '{}' directory!",
            report.output_dir.display()
        );
        let saved = self.paint(&saved, |s| s.green());
        writeln!(self.out, "{}", saved)?;

        self.covers(&report.images, &report.output_dir)
    }

    /// Show an earlier run again without generating anything.
    pub fn redisplay(&mut self, report: &RunReport) -> io::Result<()> {
        let notice = self.paint(
            "Displaying previously generated covers. Submit again to generate new covers.",
            |s| s.green(),
        );
        writeln!(self.out, "{}", notice)?;
        self.covers(&report.images, &report.output_dir)
    }

    pub fn covers(&mut self, images: &ImageSet, output_dir: &Path) -> io::Result<()> {
        for (title, covers) in images.iter() {
            let header = self.paint(&format!("Cover designs for: {}", title), |s| s.bold());
            writeln!(self.out, "\n{}", header)?;

            if covers.is_empty() {
                let warning = self.paint(
                    &format!("No images were successfully generated for '{}'.", title),
                    |s| s.yellow(),
                );
                writeln!(self.out, "{}", warning)?;
                continue;
            }

            for (index, cover) in covers.iter().enumerate() {
                let number = index + 1;
                writeln!(
                    self.out,
                    "  Cover {} ({} bytes) -> {}",
                    number,
                    cover.bytes.len(),
                    persist::cover_path(output_dir, title, number).display()
                )?;
                writeln!(self.out, "    download as: {}", download_file_name(title, number))?;
                for line in cover.description.lines() {
                    writeln!(self.out, "    | {}", line)?;
                }
            }
        }
        Ok(())
    }

    pub fn share(&mut self, base_url: &str, config: &GenerationConfig) -> io::Result<()> {
        let label = self.paint("Share this configuration:", |s| s.bold());
        writeln!(self.out, "{}", label)?;
        writeln!(self.out, "{}", codec::share_url(base_url, config))
    }
}
