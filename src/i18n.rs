use std::str::FromStr;

use thiserror::Error;

/// The two label languages. Korean is the primary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, strum_macros::Display)]
pub enum Locale {
    #[strum(serialize = "ko")]
    Ko,
    #[strum(serialize = "en")]
    En,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::Ko, Locale::En];

    /// Storage code, `ko` or `en`
    pub fn code(&self) -> &'static str {
        match self {
            Locale::Ko => "ko",
            Locale::En => "en",
        }
    }

    pub fn toggled(&self) -> Locale {
        match self {
            Locale::Ko => Locale::En,
            Locale::En => Locale::Ko,
        }
    }

    /// Pick a locale from a POSIX locale string such as `ko_KR.UTF-8`
    pub fn from_posix(value: &str) -> Locale {
        if value.to_ascii_lowercase().starts_with("ko") {
            Locale::Ko
        } else {
            Locale::En
        }
    }

    /// First-run default from `LC_ALL`, `LC_MESSAGES` then `LANG`.
    /// Korean when none of them is set.
    pub fn detect() -> Locale {
        Self::detect_from(|name| std::env::var(name).ok())
    }

    /// Language for this run: an explicit choice, else the stored one, else
    /// the environment
    pub fn resolve(explicit: Option<Locale>, stored: Option<Locale>) -> Locale {
        explicit.or(stored).unwrap_or_else(Locale::detect)
    }

    pub fn detect_from<F>(lookup: F) -> Locale
    where
        F: Fn(&str) -> Option<String>,
    {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|name| lookup(name))
            .find(|v| !v.is_empty())
            .map(|v| Locale::from_posix(&v))
            .unwrap_or(Locale::Ko)
    }

    pub fn text(&self, label: Label) -> &'static str {
        text(*self, label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown language code '{0}'")]
pub struct UnknownLocale(pub String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ko" => Ok(Locale::Ko),
            "en" => Ok(Locale::En),
            other => Err(UnknownLocale(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Title,
    Subtitle,
    Start,
    Stop,
    Save,
    Reset,
    TodayAccum,
    Sessions,
    HistoryTitle,
    DeleteAll,
    NoHistory,
    PressSave,
    NoHistoryTail,
    Date,
    Total,
    SessionCount,
    SessionList,
    LocalNote,
    Tips,
    ConfirmClear,
    LangKo,
    LangEn,
    Today,
    // terminal-only
    Running,
    Paused,
    KeyHints,
    ConfirmKeys,
    StorageWarning,
    Saved,
}

impl Label {
    pub const ALL: [Label; 29] = [
        Label::Title,
        Label::Subtitle,
        Label::Start,
        Label::Stop,
        Label::Save,
        Label::Reset,
        Label::TodayAccum,
        Label::Sessions,
        Label::HistoryTitle,
        Label::DeleteAll,
        Label::NoHistory,
        Label::PressSave,
        Label::NoHistoryTail,
        Label::Date,
        Label::Total,
        Label::SessionCount,
        Label::SessionList,
        Label::LocalNote,
        Label::Tips,
        Label::ConfirmClear,
        Label::LangKo,
        Label::LangEn,
        Label::Today,
        Label::Running,
        Label::Paused,
        Label::KeyHints,
        Label::ConfirmKeys,
        Label::StorageWarning,
        Label::Saved,
    ];
}

pub fn text(locale: Locale, label: Label) -> &'static str {
    use Label::*;
    match locale {
        Locale::Ko => match label {
            Title => "📚 공부 전용 타이머",
            Subtitle => "간단한 포모도로/집중 타이머. 저장하면 날짜별로 누적 기록됩니다 (로컬 저장).",
            Start => "시작",
            Stop => "끝(일시정지)",
            Save => "저장 (오늘에 합산)",
            Reset => "초기화(이번 세션)",
            TodayAccum => "오늘 누적:",
            Sessions => "세션",
            HistoryTitle => "📆 날짜별 기록",
            DeleteAll => "모든 기록 삭제",
            NoHistory => "아직 저장된 기록이 없어요. 타이머를 시작하고, 멈춘 뒤 ",
            PressSave => "저장",
            NoHistoryTail => "을 눌러보세요.",
            Date => "날짜",
            Total => "총 시간",
            SessionCount => "세션 수",
            SessionList => "세션 목록",
            LocalNote => "* 데이터는 이 컴퓨터의 로컬 저장소에만 저장됩니다.",
            Tips => "사용 팁: 집중 시작 → 시작 · 잠깐 쉬기 → 끝(일시정지) · 오늘 합산하려면 저장을 누르세요. 저장 후 타이머는 0으로 초기화됩니다.",
            ConfirmClear => "정말로 모든 기록을 삭제할까요? 되돌릴 수 없습니다.",
            LangKo => "한국어",
            LangEn => "English",
            Today => "오늘",
            Running => "진행 중",
            Paused => "일시정지",
            KeyHints => "(D)전체 삭제 (l)언어 (↑↓)기록 이동 (q)종료",
            ConfirmKeys => "(y) 삭제 / (n) 취소",
            StorageWarning => "⚠ 저장하지 못했습니다. 이번 실행 동안은 메모리에만 유지됩니다:",
            Saved => "저장했습니다",
        },
        Locale::En => match label {
            Title => "📚 Study Timer",
            Subtitle => "A simple focus/Pomodoro timer. When you save, it accumulates by date (stored locally).",
            Start => "Start",
            Stop => "Stop (Pause)",
            Save => "Save (Add to Today)",
            Reset => "Reset (This Session)",
            TodayAccum => "Today's total:",
            Sessions => "session(s)",
            HistoryTitle => "📆 Daily History",
            DeleteAll => "Delete All",
            NoHistory => "No records yet. Start the timer, pause, then press ",
            PressSave => "Save",
            NoHistoryTail => ".",
            Date => "Date",
            Total => "Total Time",
            SessionCount => "# Sessions",
            SessionList => "Sessions",
            LocalNote => "* Data is saved only in this computer's local storage.",
            Tips => "Tip: Start focusing → Start · Take a break → Stop (Pause) · To add to today's total, press Save. After saving, the timer resets to 0.",
            ConfirmClear => "Delete ALL history? This cannot be undone.",
            LangKo => "한국어",
            LangEn => "English",
            Today => "Today",
            Running => "running",
            Paused => "paused",
            KeyHints => "(D)elete all (l)anguage (↑↓) scroll history (q)uit",
            ConfirmKeys => "(y) delete / (n) cancel",
            StorageWarning => "⚠ Could not save; keeping data in memory for this run:",
            Saved => "Saved",
        },
    }
}
