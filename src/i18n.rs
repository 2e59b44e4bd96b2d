use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ── Languages ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    It,
    En,
    Es,
}

pub const LANGUAGES: [Language; 3] = [Language::It, Language::En, Language::Es];

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::It => "it",
            Language::En => "en",
            Language::Es => "es",
        }
    }

    /// Name of the language written in that language.
    pub fn native_name(self) -> &'static str {
        match self {
            Language::It => "Italiano",
            Language::En => "English",
            Language::Es => "Español",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported language code: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "it" => Ok(Language::It),
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}

// ── Keys ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKey {
    Welcome,
    SelectLanguage,
    Continue,
    Terminal,
    Notepad,
    FileManager,
    Settings,
    NewFile,
    NewFolder,
    Save,
    Open,
    Delete,
}

pub fn tr(lang: Language, key: TextKey) -> &'static str {
    match lang {
        Language::It => italian(key),
        Language::En => english(key),
        Language::Es => spanish(key),
    }
}

fn english(key: TextKey) -> &'static str {
    match key {
        TextKey::Welcome => "Welcome to FutureOS",
        TextKey::SelectLanguage => "Select your language",
        TextKey::Continue => "Continue",
        TextKey::Terminal => "Terminal",
        TextKey::Notepad => "Notepad",
        TextKey::FileManager => "File Manager",
        TextKey::Settings => "Settings",
        TextKey::NewFile => "New File",
        TextKey::NewFolder => "New Folder",
        TextKey::Save => "Save",
        TextKey::Open => "Open",
        TextKey::Delete => "Delete",
    }
}

fn italian(key: TextKey) -> &'static str {
    match key {
        TextKey::Welcome => "Benvenuto in FutureOS",
        TextKey::SelectLanguage => "Seleziona la tua lingua",
        TextKey::Continue => "Continua",
        TextKey::Terminal => "Terminale",
        TextKey::Notepad => "Blocco note",
        TextKey::FileManager => "Gestione file",
        TextKey::Settings => "Impostazioni",
        TextKey::NewFile => "Nuovo file",
        TextKey::NewFolder => "Nuova cartella",
        TextKey::Save => "Salva",
        TextKey::Open => "Apri",
        TextKey::Delete => "Elimina",
    }
}

fn spanish(key: TextKey) -> &'static str {
    match key {
        TextKey::Welcome => "Bienvenido a FutureOS",
        TextKey::SelectLanguage => "Selecciona tu idioma",
        TextKey::Continue => "Continuar",
        TextKey::Terminal => "Terminal",
        TextKey::Notepad => "Bloc de notas",
        TextKey::FileManager => "Administrador de archivos",
        TextKey::Settings => "Configuración",
        TextKey::NewFile => "Nuevo archivo",
        TextKey::NewFolder => "Nueva carpeta",
        TextKey::Save => "Guardar",
        TextKey::Open => "Abrir",
        TextKey::Delete => "Eliminar",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_round_trip_through_from_str() {
        for lang in LANGUAGES {
            assert_eq!(lang.code().parse::<Language>(), Ok(lang));
        }
        assert_eq!(" EN ".parse::<Language>(), Ok(Language::En));
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn app_titles_are_localized() {
        assert_eq!(tr(Language::It, TextKey::FileManager), "Gestione file");
        assert_eq!(tr(Language::En, TextKey::FileManager), "File Manager");
        assert_eq!(tr(Language::Es, TextKey::Settings), "Configuración");
    }

    #[test]
    fn action_labels_are_localized() {
        assert_eq!(tr(Language::It, TextKey::NewFolder), "Nuova cartella");
        assert_eq!(tr(Language::En, TextKey::Delete), "Delete");
        assert_eq!(tr(Language::Es, TextKey::Save), "Guardar");
    }

    #[test]
    fn default_language_is_italian() {
        assert_eq!(Language::default(), Language::It);
    }
}
