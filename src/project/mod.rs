//! Project persistence.
//!
//! A project is the list of spectral classes plus the shared band count.
//! It is stored as an XML document:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <!--Project File Exported by HSIDataGenerator-->
//! <spectral_dictionary>
//!   <spectrum>
//!     <peaks>
//!       <peak>
//!         <position>0.5</position>
//!         <amplitude>0.8</amplitude>
//!         <width>0.01</width>
//!       </peak>
//!     </peaks>
//!     <name>Background</name>
//!     <color>#ffffff</color>
//!   </spectrum>
//!   <num_bands>100</num_bands>
//! </spectral_dictionary>
//! ```
//!
//! The layout is not part of the project file.

use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::color::Rgb;
use crate::constants::{BACKGROUND_SPECTRUM_NAME, DEFAULT_NUM_BANDS, DEFAULT_SPECTRUM_NAME};
use crate::error::{HsiError, Result};
use crate::spectrum::SpectrumModel;

const PROJECT_FILE_HEADER: &str = "Project File Exported by HSIDataGenerator";

const SPECTRAL_DICTIONARY_TAG: &str = "spectral_dictionary";
const SPECTRUM_TAG: &str = "spectrum";
const PEAKS_TAG: &str = "peaks";
const PEAK_TAG: &str = "peak";
const POSITION_TAG: &str = "position";
const AMPLITUDE_TAG: &str = "amplitude";
const WIDTH_TAG: &str = "width";
const NAME_TAG: &str = "name";
const COLOR_TAG: &str = "color";
const NUM_BANDS_TAG: &str = "num_bands";

/// Spectral classes and the band count they are exported with.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    /// Classes in class-index order
    pub spectra: Vec<SpectrumModel>,
    /// Number of bands each spectrum is sampled at
    pub num_bands: usize,
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Project {
    /// A fresh project holding only the flat white "Background" class.
    pub fn new() -> Self {
        Self {
            spectra: vec![SpectrumModel::with_name_and_color(
                BACKGROUND_SPECTRUM_NAME,
                Rgb::WHITE,
            )],
            num_bands: DEFAULT_NUM_BANDS,
        }
    }

    /// A fresh project with two example classes after the background.
    pub fn with_sample_classes() -> Self {
        let mut project = Self::new();

        let mut vegetation = SpectrumModel::with_name_and_color("Vegetation", Rgb::palette(1));
        vegetation.add_peak(0.3, 0.4, 0.005);
        vegetation.add_peak(0.75, 0.9, 0.02);
        project.spectra.push(vegetation);

        let mut mineral = SpectrumModel::with_name_and_color("Mineral", Rgb::palette(2));
        mineral.add_peak(0.15, 0.6, 0.01);
        mineral.add_peak(0.55, 0.5, 0.03);
        mineral.add_peak(0.9, 0.3, 0.002);
        project.spectra.push(mineral);

        project
    }
}

/// Reads and writes [`Project`] XML documents.
pub struct ProjectSerializer;

impl ProjectSerializer {
    /// Serialize a project to an XML string.
    pub fn save(project: &Project) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| HsiError::Xml(e.into()))?;
        writer
            .write_event(Event::Comment(BytesText::new(PROJECT_FILE_HEADER)))
            .map_err(|e| HsiError::Xml(e.into()))?;
        start(&mut writer, SPECTRAL_DICTIONARY_TAG)?;

        for spectrum in &project.spectra {
            start(&mut writer, SPECTRUM_TAG)?;
            start(&mut writer, PEAKS_TAG)?;
            for peak in spectrum.peaks() {
                start(&mut writer, PEAK_TAG)?;
                text_element(&mut writer, POSITION_TAG, &peak.position.to_string())?;
                text_element(&mut writer, AMPLITUDE_TAG, &peak.amplitude.to_string())?;
                text_element(&mut writer, WIDTH_TAG, &peak.width.to_string())?;
                end(&mut writer, PEAK_TAG)?;
            }
            end(&mut writer, PEAKS_TAG)?;
            text_element(&mut writer, NAME_TAG, spectrum.name())?;
            text_element(&mut writer, COLOR_TAG, &spectrum.color().to_hex())?;
            end(&mut writer, SPECTRUM_TAG)?;
        }

        text_element(&mut writer, NUM_BANDS_TAG, &project.num_bands.to_string())?;
        end(&mut writer, SPECTRAL_DICTIONARY_TAG)?;

        String::from_utf8(writer.into_inner())
            .map_err(|_| HsiError::invalid_format("Invalid UTF-8 in XML"))
    }

    /// Serialize a project and write it to `path`.
    pub fn save_to_file(project: &Project, path: &Path) -> Result<()> {
        let xml = Self::save(project)?;
        let mut file = std::fs::File::create(path).map_err(|e| HsiError::file_open(path, e))?;
        file.write_all(xml.as_bytes())?;
        log::info!(
            "Saved project with {} spectra to {:?}",
            project.spectra.len(),
            path
        );
        Ok(())
    }

    /// Parse a project document.
    ///
    /// Unknown elements are skipped wherever they appear. Peaks go through
    /// [`SpectrumModel::add_peak`], so out-of-range peak fields load as zero
    /// with a warning. Names are kept verbatim, surrounding whitespace
    /// included. A spectrum without a `<color>` gets the palette color of
    /// its position. A missing `num_bands` falls back to the default.
    pub fn load(xml: &str) -> Result<Project> {
        let mut reader = Reader::from_str(xml);
        let mut state = LoadState::default();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    state.open(String::from_utf8_lossy(e.name().as_ref()).to_string())?;
                }
                Ok(Event::Empty(ref e)) => {
                    state.open(String::from_utf8_lossy(e.name().as_ref()).to_string())?;
                    state.close()?;
                }
                Ok(Event::End(_)) => state.close()?,
                Ok(Event::Text(ref e)) => {
                    state.text.push_str(&e.unescape().map_err(HsiError::Xml)?);
                }
                Ok(Event::CData(ref e)) => {
                    state.text.push_str(&String::from_utf8_lossy(e));
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(HsiError::Xml(e)),
                _ => {}
            }
        }

        if !state.found_root {
            return Err(HsiError::invalid_format(format!(
                "Missing <{SPECTRAL_DICTIONARY_TAG}> root element"
            )));
        }

        let num_bands = state.num_bands.unwrap_or_else(|| {
            log::warn!(
                "Project has no <{}>; using {}",
                NUM_BANDS_TAG,
                DEFAULT_NUM_BANDS
            );
            DEFAULT_NUM_BANDS
        });
        log::debug!(
            "Parsed project with {} spectra and {} bands",
            state.spectra.len(),
            num_bands
        );
        Ok(Project {
            spectra: state.spectra,
            num_bands,
        })
    }

    /// Read and parse the project stored at `path`.
    pub fn load_from_file(path: &Path) -> Result<Project> {
        let xml = std::fs::read_to_string(path).map_err(|e| HsiError::file_open(path, e))?;
        let project = Self::load(&xml)?;
        log::info!(
            "Loaded project with {} spectra from {:?}",
            project.spectra.len(),
            path
        );
        Ok(project)
    }
}

/// Peak values collected between `<peak>` and `</peak>`.
#[derive(Debug, Default)]
struct PeakFields {
    position: f64,
    amplitude: f64,
    width: f64,
}

/// Parser state while walking the element tree.
#[derive(Debug, Default)]
struct LoadState {
    /// Open elements, root first
    path: Vec<String>,
    /// Text of the innermost open element
    text: String,
    found_root: bool,
    spectra: Vec<SpectrumModel>,
    spectrum: Option<SpectrumModel>,
    peak: PeakFields,
    num_bands: Option<usize>,
}

impl LoadState {
    fn open(&mut self, name: String) -> Result<()> {
        if self.path.is_empty() {
            check_root(&name)?;
            self.found_root = true;
        }
        self.path.push(name);
        self.text.clear();

        let tags: Vec<&str> = self.path.iter().map(String::as_str).collect();
        match tags.as_slice() {
            [_, SPECTRUM_TAG] => {
                self.spectrum = Some(SpectrumModel::with_name_and_color(
                    DEFAULT_SPECTRUM_NAME,
                    Rgb::palette(self.spectra.len()),
                ));
            }
            [_, SPECTRUM_TAG, PEAKS_TAG, PEAK_TAG] => self.peak = PeakFields::default(),
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let text = std::mem::take(&mut self.text);
        let tags: Vec<&str> = self.path.iter().map(String::as_str).collect();
        match tags.as_slice() {
            [_, SPECTRUM_TAG, PEAKS_TAG, PEAK_TAG, POSITION_TAG] => {
                self.peak.position = parse_number(POSITION_TAG, &text)?;
            }
            [_, SPECTRUM_TAG, PEAKS_TAG, PEAK_TAG, AMPLITUDE_TAG] => {
                self.peak.amplitude = parse_number(AMPLITUDE_TAG, &text)?;
            }
            [_, SPECTRUM_TAG, PEAKS_TAG, PEAK_TAG, WIDTH_TAG] => {
                self.peak.width = parse_number(WIDTH_TAG, &text)?;
            }
            [_, SPECTRUM_TAG, PEAKS_TAG, PEAK_TAG] => {
                if let Some(spectrum) = self.spectrum.as_mut() {
                    spectrum.add_peak(self.peak.position, self.peak.amplitude, self.peak.width);
                }
            }
            [_, SPECTRUM_TAG, NAME_TAG] => {
                if let Some(spectrum) = self.spectrum.as_mut() {
                    spectrum.set_name(text);
                }
            }
            [_, SPECTRUM_TAG, COLOR_TAG] => match Rgb::from_str(text.trim()) {
                Ok(color) => {
                    if let Some(spectrum) = self.spectrum.as_mut() {
                        spectrum.set_color(color);
                    }
                }
                Err(e) => log::warn!("Keeping default color: {}", e),
            },
            [_, SPECTRUM_TAG] => self.spectra.extend(self.spectrum.take()),
            [_, NUM_BANDS_TAG] => {
                self.num_bands = Some(parse_number(NUM_BANDS_TAG, &text)?);
            }
            _ => {}
        }
        self.path.pop();
        Ok(())
    }
}

fn check_root(name: &str) -> Result<()> {
    if name == SPECTRAL_DICTIONARY_TAG {
        Ok(())
    } else {
        Err(HsiError::invalid_format(format!(
            "Expected <{SPECTRAL_DICTIONARY_TAG}> root element, found <{name}>"
        )))
    }
}

fn parse_number<T: FromStr>(tag: &str, text: &str) -> Result<T> {
    let text = text.trim();
    text.parse()
        .map_err(|_| HsiError::invalid_format(format!("Invalid <{tag}> value '{text}'")))
}

fn start<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(|e| HsiError::Xml(e.into()))?;
    Ok(())
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| HsiError::Xml(e.into()))?;
    Ok(())
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        writer
            .write_event(Event::Empty(BytesStart::new(name)))
            .map_err(|e| HsiError::Xml(e.into()))?;
        return Ok(());
    }
    start(writer, name)?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(|e| HsiError::Xml(e.into()))?;
    end(writer, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::spectrum::PeakDistribution;

    #[test]
    fn test_new_project_has_background() {
        let project = Project::new();
        assert_eq!(project.spectra.len(), 1);
        assert_eq!(project.spectra[0].name(), "Background");
        assert_eq!(project.spectra[0].color(), Rgb::WHITE);
        assert!(project.spectra[0].is_empty());
        assert_eq!(project.num_bands, DEFAULT_NUM_BANDS);
    }

    #[test]
    fn test_save_layout() {
        let mut project = Project::new();
        project.spectra[0].add_peak(0.5, 0.25, 0.125);
        project.num_bands = 42;

        let xml = ProjectSerializer::save(&project).unwrap();
        assert!(xml.contains("<!--Project File Exported by HSIDataGenerator-->"));
        assert!(xml.contains("<position>0.5</position>"));
        assert!(xml.contains("<amplitude>0.25</amplitude>"));
        assert!(xml.contains("<width>0.125</width>"));
        assert!(xml.contains("<name>Background</name>"));
        assert!(xml.contains("<color>#ffffff</color>"));
        assert!(xml.contains("<num_bands>42</num_bands>"));
    }

    #[test]
    fn test_round_trip() {
        let project = Project::with_sample_classes();
        let xml = ProjectSerializer::save(&project).unwrap();
        let loaded = ProjectSerializer::load(&xml).unwrap();
        assert_eq!(loaded, project);
    }

    #[test]
    fn test_round_trip_escapes_names() {
        let mut project = Project::new();
        project.spectra[0].set_name("Soil & <Rock>");
        let xml = ProjectSerializer::save(&project).unwrap();
        let loaded = ProjectSerializer::load(&xml).unwrap();
        assert_eq!(loaded.spectra[0].name(), "Soil & <Rock>");
    }

    #[test]
    fn test_round_trip_keeps_names_verbatim() {
        let mut project = Project::new();
        project.spectra[0].set_name("");
        project
            .spectra
            .push(SpectrumModel::with_name_and_color("  Grass ", Rgb::BLACK));

        let xml = ProjectSerializer::save(&project).unwrap();
        assert!(xml.contains("<name/>"));
        assert!(xml.contains("<name>  Grass </name>"));
        let loaded = ProjectSerializer::load(&xml).unwrap();
        assert_eq!(loaded.spectra[0].name(), "");
        assert_eq!(loaded.spectra[1].name(), "  Grass ");
        assert_eq!(loaded, project);
    }

    #[test]
    fn test_load_self_closing_name_is_empty() {
        let xml = "<spectral_dictionary><spectrum><name/></spectrum></spectral_dictionary>";
        let project = ProjectSerializer::load(xml).unwrap();
        assert_eq!(project.spectra[0].name(), "");
    }

    #[test]
    fn test_missing_color_is_deterministic() {
        let xml = "<spectral_dictionary>\
                   <spectrum><name>A</name></spectrum>\
                   <spectrum><name>B</name></spectrum>\
                   </spectral_dictionary>";
        let first = ProjectSerializer::load(xml).unwrap();
        let second = ProjectSerializer::load(xml).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.spectra[0].color(), Rgb::palette(0));
        assert_eq!(first.spectra[1].color(), Rgb::palette(1));
    }

    #[test]
    fn test_load_trims_numbers_and_colors() {
        let xml = "<spectral_dictionary><spectrum>\
                   <peaks><peak><position> 0.5 </position><amplitude>\n0.25\n</amplitude>\
                   <width>0.1</width></peak></peaks>\
                   <color> #00ff00 </color></spectrum>\
                   <num_bands> 16 </num_bands></spectral_dictionary>";
        let project = ProjectSerializer::load(xml).unwrap();
        assert_eq!(project.num_bands, 16);
        assert_eq!(project.spectra[0].color(), Rgb::new(0, 255, 0));
        assert_eq!(
            project.spectra[0].peaks(),
            &[PeakDistribution::new(0.5, 0.25, 0.1)]
        );
    }

    #[test]
    fn test_load_skips_unknown_elements() {
        let xml = r#"<?xml version="1.0"?>
<spectral_dictionary>
  <author>someone</author>
  <spectrum>
    <peaks>
      <peak>
        <position>0.2</position>
        <shape>gaussian</shape>
        <amplitude>0.7</amplitude>
        <width>0.05</width>
      </peak>
      <annotation><position>0.9</position></annotation>
    </peaks>
    <name>Water</name>
    <color>#0000ff</color>
    <notes><name>ignored</name></notes>
  </spectrum>
  <layout width="10"/>
  <num_bands>64</num_bands>
</spectral_dictionary>
"#;
        let project = ProjectSerializer::load(xml).unwrap();
        assert_eq!(project.num_bands, 64);
        assert_eq!(project.spectra.len(), 1);
        let water = &project.spectra[0];
        assert_eq!(water.name(), "Water");
        assert_eq!(water.color(), Rgb::new(0, 0, 255));
        assert_eq!(water.peaks(), &[PeakDistribution::new(0.2, 0.7, 0.05)]);
    }

    #[test]
    fn test_load_rejects_out_of_range_peak_fields() {
        let xml = "<spectral_dictionary><spectrum><peaks>\
                   <peak><position>1.5</position><amplitude>0.5</amplitude><width>0.1</width></peak>\
                   </peaks><name>A</name></spectrum><num_bands>8</num_bands></spectral_dictionary>";
        let project = ProjectSerializer::load(xml).unwrap();
        assert_eq!(
            project.spectra[0].peaks(),
            &[PeakDistribution::new(0.0, 0.5, 0.1)]
        );
    }

    #[test]
    fn test_load_without_num_bands_uses_default() {
        let xml = "<spectral_dictionary><spectrum><name>A</name></spectrum></spectral_dictionary>";
        let project = ProjectSerializer::load(xml).unwrap();
        assert_eq!(project.num_bands, DEFAULT_NUM_BANDS);
        assert_eq!(project.spectra[0].name(), "A");
        assert!(project.spectra[0].is_empty());
    }

    #[test]
    fn test_load_rejects_wrong_root() {
        let err = ProjectSerializer::load("<project/>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
        let err = ProjectSerializer::load("").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_load_rejects_malformed_number() {
        let xml = "<spectral_dictionary><num_bands>many</num_bands></spectral_dictionary>";
        let err = ProjectSerializer::load(xml).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("project.xml");
        let project = Project::with_sample_classes();

        ProjectSerializer::save_to_file(&project, &path).unwrap();
        let loaded = ProjectSerializer::load_from_file(&path).unwrap();
        assert_eq!(loaded, project);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let err = ProjectSerializer::load_from_file(&dir.path().join("missing.xml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileOpenFailed);
    }
}
