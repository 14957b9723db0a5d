//! User-facing strings in English and Japanese

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Display language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ja,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ja => "ja",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Language::En => Language::Ja,
            Language::Ja => Language::En,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "en" => Ok(Language::En),
            "ja" => Ok(Language::Ja),
            other => Err(format!("invalid language '{}', expected en or ja", other)),
        }
    }
}

/// A translatable string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    MarkdownEditor,
    Home,
    Articles,
    YourArticles,
    DarkMode,
    LightMode,
    Saved,
    Saving,
    CopyText,
    Copied,
    HideEditor,
    ShowEditor,
    HidePreview,
    ShowPreview,
    AddArticle,
    NoArticles,
    Loading,
    SelectArticle,
    AddArticleTitle,
    DeleteArticle,
    SortByNewest,
    SortByOldest,
    SwitchToLightMode,
    SwitchToDarkMode,
    SwitchLanguage,
    Welcome,
    Subtitle,
    StorageNotice,
    GettingStarted,
}

/// One feature blurb on the home page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    pub title: &'static str,
    pub description: &'static str,
}

/// Translate `text` into `lang`
pub fn tr(lang: Language, text: Text) -> &'static str {
    match lang {
        Language::En => en(text),
        Language::Ja => ja(text),
    }
}

fn en(text: Text) -> &'static str {
    match text {
        Text::MarkdownEditor => "Markdown Editor",
        Text::Home => "Home",
        Text::Articles => "Articles",
        Text::YourArticles => "Your Articles",
        Text::DarkMode => "Dark Mode",
        Text::LightMode => "Light Mode",
        Text::Saved => "Saved",
        Text::Saving => "Saving...",
        Text::CopyText => "Copy Text",
        Text::Copied => "Copied to clipboard!",
        Text::HideEditor => "Hide Editor",
        Text::ShowEditor => "Show Editor",
        Text::HidePreview => "Hide Preview",
        Text::ShowPreview => "Show Preview",
        Text::AddArticle => "Add Article",
        Text::NoArticles => "No articles yet. Add one above!",
        Text::Loading => "Loading articles...",
        Text::SelectArticle => "Select an article from the sidebar to start editing.",
        Text::AddArticleTitle => "Add a new article title...",
        Text::DeleteArticle => "Delete article",
        Text::SortByNewest => "Sort by newest",
        Text::SortByOldest => "Sort by oldest",
        Text::SwitchToLightMode => "Switch to light mode",
        Text::SwitchToDarkMode => "Switch to dark mode",
        Text::SwitchLanguage => "Switch language",
        Text::Welcome => "Welcome to Markdown Editor",
        Text::Subtitle => "A modern, feature-rich markdown editor for your writing needs",
        Text::StorageNotice => {
            "All data is stored locally on this machine. Nothing is sent to any server."
        }
        Text::GettingStarted => "Getting Started",
    }
}

fn ja(text: Text) -> &'static str {
    match text {
        Text::MarkdownEditor => "マークダウン エディター",
        Text::Home => "ホーム",
        Text::Articles => "記事一覧",
        Text::YourArticles => "あなたの記事",
        Text::DarkMode => "ダークモード",
        Text::LightMode => "ライトモード",
        Text::Saved => "保存済み",
        Text::Saving => "保存中...",
        Text::CopyText => "テキストをコピー",
        Text::Copied => "クリップボードにコピーしました！",
        Text::HideEditor => "エディターを隠す",
        Text::ShowEditor => "エディターを表示",
        Text::HidePreview => "プレビューを隠す",
        Text::ShowPreview => "プレビューを表示",
        Text::AddArticle => "記事を追加",
        Text::NoArticles => "まだ記事がありません。上のボタンから追加してください。",
        Text::Loading => "記事を読み込み中...",
        Text::SelectArticle => "サイドバーから記事を選択して編集を開始してください。",
        Text::AddArticleTitle => "新しい記事のタイトルを入力...",
        Text::DeleteArticle => "記事を削除",
        Text::SortByNewest => "新しい順に並べ替え",
        Text::SortByOldest => "古い順に並べ替え",
        Text::SwitchToLightMode => "ライトモードに切り替え",
        Text::SwitchToDarkMode => "ダークモードに切り替え",
        Text::SwitchLanguage => "言語を切り替え",
        Text::Welcome => "マークダウン エディターへようこそ",
        Text::Subtitle => "モダンで機能豊富なマークダウンエディターで、快適な執筆体験を",
        Text::StorageNotice => {
            "すべてのデータはこのマシンのローカルに保存されます。サーバーには一切送信されません。"
        }
        Text::GettingStarted => "使い方",
    }
}

/// Feature blurbs shown on the home page
pub fn features(lang: Language) -> [Feature; 4] {
    match lang {
        Language::En => [
            Feature {
                title: "Real-time Markdown Preview",
                description: "See your markdown rendered in real-time as you type",
            },
            Feature {
                title: "JST Timestamp",
                description: "Automatic JST timestamp tracking for all your articles",
            },
            Feature {
                title: "Dark Mode Support",
                description: "Comfortable writing experience in both light and dark modes",
            },
            Feature {
                title: "Flexible Organization",
                description: "Sort and organize your articles by creation time",
            },
        ],
        Language::Ja => [
            Feature {
                title: "リアルタイムプレビュー",
                description: "入力と同時にマークダウンのプレビューを確認できます",
            },
            Feature {
                title: "JST タイムスタンプ",
                description: "全ての記事に日本標準時のタイムスタンプを自動で記録",
            },
            Feature {
                title: "ダークモード対応",
                description: "ライト・ダークモードの両方で快適な執筆環境を提供",
            },
            Feature {
                title: "柔軟な整理機能",
                description: "作成時刻でソートして記事を整理",
            },
        ],
    }
}

/// Numbered getting-started steps shown on the home page
pub fn getting_started_steps(lang: Language) -> [&'static str; 5] {
    match lang {
        Language::En => [
            "Open \"Articles\" in the sidebar to view your articles",
            "Create a new article with \"Add Article\"",
            "Write your content using markdown syntax",
            "Use the preview pane to see the rendered output",
            "Your content is automatically saved as you type",
        ],
        Language::Ja => [
            "サイドバーの「記事一覧」を開く",
            "「記事を追加」で新しい記事を作成",
            "マークダウン記法でコンテンツを作成",
            "プレビューペインで表示を確認",
            "入力内容は自動で保存されます",
        ],
    }
}
