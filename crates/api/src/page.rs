//! Single-page upload UI

use axum::{extract::State, response::Html};
use std::sync::Arc;

use crate::AppState;

/// Serve the classifier page
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render(state.top_classes))
}

/// Page markup with the ranked display limited to `top_classes` rows
pub fn render(top_classes: usize) -> String {
    PAGE_HTML.replace("{{TOP_CLASSES}}", &top_classes.to_string())
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Nature Scene Classifier</title>
    <style>
        body {
            background-color: #eef5f0;
            font-family: 'Segoe UI', sans-serif;
            margin: 0;
            padding: 24px;
        }
        .box {
            background: #ffffffdd;
            padding: 18px;
            border-radius: 12px;
            margin-bottom: 14px;
            box-shadow: 0px 1px 3px rgba(0,0,0,0.05);
        }
        .title { color: #2e4f3e; font-size: 32px; font-weight: bold; margin-bottom: 6px; }
        .sub { color: #3b5f4a; font-size: 18px; }
        .row { display: flex; gap: 14px; flex-wrap: wrap; }
        .col { flex: 1; min-width: 280px; }
        #preview { max-width: 100%; max-height: 300px; display: none; margin-top: 12px; border-radius: 8px; }
        button {
            background-color: #4a7c59;
            color: white;
            border-radius: 10px;
            font-size: 16px;
            font-weight: bold;
            padding: 10px 20px;
            border: none;
            margin-top: 12px;
            cursor: pointer;
        }
        button:disabled { opacity: 0.6; cursor: wait; }
        .label-row { margin: 8px 0; }
        .label-name { display: flex; justify-content: space-between; color: #2e4f3e; }
        .bar { height: 10px; background: #d6e6db; border-radius: 5px; overflow: hidden; }
        .bar > div { height: 100%; background: #4a7c59; }
        .top { font-size: 26px; font-weight: bold; color: #2e4f3e; margin-bottom: 10px; }
        .error { color: #a33; font-weight: bold; }
    </style>
</head>
<body>
    <div class="box">
        <div class="title">🌿 Nature Scene Classifier</div>
        <div class="sub">
            Upload an image and the model will classify it into:
            <b>forest · beach · bird · fish</b>
        </div>
    </div>

    <div class="row">
        <div class="col box">
            <label for="image">Upload an image</label><br>
            <input id="image" type="file" accept="image/*">
            <img id="preview" alt="preview">
            <br>
            <button id="classify">🔍 Classify</button>
        </div>
        <div class="col box">
            <div>Prediction</div>
            <div id="result"></div>
        </div>
    </div>

    <script>
        const TOP_CLASSES = {{TOP_CLASSES}};
        const input = document.getElementById('image');
        const preview = document.getElementById('preview');
        const button = document.getElementById('classify');
        const result = document.getElementById('result');

        input.addEventListener('change', () => {
            const file = input.files[0];
            if (file) {
                preview.src = URL.createObjectURL(file);
                preview.style.display = 'block';
            }
        });

        function showError(message) {
            result.innerHTML = '';
            const div = document.createElement('div');
            div.className = 'error';
            div.textContent = message;
            result.appendChild(div);
        }

        function showRanked(scores) {
            result.innerHTML = '';
            const entries = Object.entries(scores);
            if (entries.length === 0) return;

            const top = document.createElement('div');
            top.className = 'top';
            top.textContent = entries[0][0];
            result.appendChild(top);

            for (const [label, p] of entries) {
                const row = document.createElement('div');
                row.className = 'label-row';
                const name = document.createElement('div');
                name.className = 'label-name';
                name.innerHTML = '<span></span><span></span>';
                name.children[0].textContent = label;
                name.children[1].textContent = (p * 100).toFixed(1) + '%';
                const bar = document.createElement('div');
                bar.className = 'bar';
                const fill = document.createElement('div');
                fill.style.width = (p * 100).toFixed(1) + '%';
                bar.appendChild(fill);
                row.appendChild(name);
                row.appendChild(bar);
                result.appendChild(row);
            }
        }

        button.addEventListener('click', async () => {
            const file = input.files[0];
            button.disabled = true;
            try {
                const response = await fetch('/api/v1/classify?top=' + TOP_CLASSES, {
                    method: 'POST',
                    body: file || new Blob([]),
                });
                const scores = await response.json();
                if ('error' in scores) {
                    showError(file ? 'Could not classify this image.' : 'Please upload an image first.');
                } else {
                    showRanked(scores);
                }
            } catch (e) {
                showError('Could not reach the classifier.');
            } finally {
                button.disabled = false;
            }
        });
    </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_injects_top_classes() {
        let html = render(3);
        assert!(html.contains("const TOP_CLASSES = 3;"));
        assert!(!html.contains("{{TOP_CLASSES}}"));
        assert!(html.contains("<title>Nature Scene Classifier</title>"));
    }
}
