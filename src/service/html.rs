// 该文件是 RainCity Hazard （雨城路况） 项目的一部分。
// src/service/html.rs - 网页界面
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 RainCity Hazard 项目组

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>RainCity Hazard</title>
<style>
  body { font-family: sans-serif; margin: 0; background: #f4f5f7; color: #222; }
  header { background: #1f2937; color: #fff; padding: 12px 24px; }
  main { display: flex; flex-wrap: wrap; gap: 24px; padding: 24px; }
  section { background: #fff; border-radius: 8px; padding: 16px; flex: 1 1 420px; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
  h2 { font-size: 16px; margin-top: 0; }
  img { max-width: 100%; display: block; margin-top: 12px; }
  pre { background: #111827; color: #d1fae5; padding: 12px; border-radius: 6px; overflow: auto; min-height: 120px; }
  button { margin-top: 12px; padding: 8px 20px; border: 0; border-radius: 6px; background: #f97316; color: #fff; cursor: pointer; }
  button:disabled { background: #9ca3af; }
  .error { color: #b91c1c; }
</style>
</head>
<body>
<header><strong>RainCity Hazard</strong> 道路隐患检测</header>
<main>
  <section>
    <h2>输入图像</h2>
    <input id="file" type="file" accept="image/*">
    <img id="preview" alt="">
    <button id="submit" disabled>检测</button>
    <p id="status"></p>
  </section>
  <section>
    <h2>标注图像</h2>
    <img id="labeled" alt="">
    <h2>检测数据</h2>
    <pre id="json"></pre>
  </section>
</main>
<script>
  const file = document.getElementById('file');
  const preview = document.getElementById('preview');
  const submit = document.getElementById('submit');
  const statusLine = document.getElementById('status');
  const labeled = document.getElementById('labeled');
  const json = document.getElementById('json');

  file.addEventListener('change', () => {
    const f = file.files[0];
    submit.disabled = !f;
    preview.src = f ? URL.createObjectURL(f) : '';
  });

  submit.addEventListener('click', async () => {
    const f = file.files[0];
    if (!f) return;
    submit.disabled = true;
    statusLine.className = '';
    statusLine.textContent = '推理中...';
    try {
      const resp = await fetch('/api/predict', {
        method: 'POST',
        headers: { 'Content-Type': f.type || 'application/octet-stream' },
        body: f,
      });
      const data = await resp.json();
      if (!resp.ok) throw new Error(data.error || resp.statusText);
      labeled.src = data.image;
      json.textContent = JSON.stringify(data.detections, null, 2);
      statusLine.textContent = `完成，耗时 ${data.elapsed_ms} ms，隐患评分 ${data.assessment.score}`;
    } catch (e) {
      statusLine.className = 'error';
      statusLine.textContent = e.message;
    } finally {
      submit.disabled = false;
    }
  });
</script>
</body>
</html>
"#;
