// src/ingest/prompts.rs
//! Fixed generation prompts, one per category.

pub const NEWS_PROMPT: &str = concat!(
    "Generate exactly 5 very recent technology news stories, published within the last 5 days, strictly relevant to students, early-career developers, and tech learners. ",
    "Focus on real-world innovation and learning impact, especially in rural (Tier 2/3) and metro areas. Avoid any repeated, outdated, or irrelevant content. ",
    "Return only the output as a strict JSON array of 5 objects, where each object must contain: ",
    "\"title\": short and clear headline (string), ",
    "\"summary\": max 60 words, student-friendly, plain English, no jargon, ",
    "\"link\": valid HTTPS URL from a real, trustworthy source. ",
    "Use only the most trusted international and Indian sources such as: WSJ, TechCrunch, EdSurge, Times of India, Indian Express, The Hindu, BBC, The Verge, Reuters, TIME, EdTechReview, HolonIQ, Nikkei Asia, Microsoft News, EdTech Hub, UNESCO, etc. ",
    "Only cover these categories: Advanced AI in Education, Must-Have Tech Gadgets, Digital Classroom Innovations, Major Tech Industry Shifts, Internship & Job Opportunities, AI Tools, Bootcamps, Campus Entrepreneurship, Cybersecurity for Students, Scholarships, Green Tech in Education, Women in STEM, Regional Language EdTech, and Student Empowerment in Tier 2/3. ",
    "Do not include news older than 5 days, AI-generated content, or repeated stories. Output must be clean JSON array. No comments or notes."
);

pub const JOBS_PROMPT: &str = concat!(
    "Fetch exactly 5 currently active, verified, and relevant job listings for freshers, recent graduates, or early-career software professionals in India. ",
    "Include remote, hybrid, or onsite roles. Listings must be posted within the last 3 days only and should not be duplicated. ",
    "Each job must be from a different platform. ",
    "Allowed platforms: LinkedIn Jobs, Indeed India, Internshala, AngelList (Wellfound), Microsoft Careers, Amazon Jobs, Google Careers, Radixweb, Cognizant, Infosys, IBM, GitHub Jobs, EdTech platforms. ",
    "If fewer than 5 unique platforms have results, allow duplicates from the most recent and relevant platforms to fill the list. ",
    "Each job must include the following fields: ",
    "- \"title\": Job title (short and clear) ",
    "- \"company\": Employer name ",
    "- \"location\": City, Remote, or Hybrid ",
    "- \"link\": A valid, direct job application or listing URL ",
    "Respond only with a clean JSON array of 5 job objects. Do not include any text, notes, summaries, or explanations outside the JSON."
);

pub const INTERNSHIPS_PROMPT: &str = concat!(
    "Fetch up to 5 currently active and verified internship opportunities in India for students and fresh graduates in software-related roles. ",
    "These internships must be suitable for learners with little to no professional experience and should preferably mention that they offer a stipend if available. ",
    "Domains must include Web Development, Mobile App Development (Android/iOS), AI/ML, Data Science, Cybersecurity, Cloud Computing, or QA/Testing. ",
    "Only return roles from the last 7 days, no expired, duplicated, or irrelevant listings. ",
    "Prefer internships from different platforms in this list: Internshala, AngelList Talent (angel.co/jobs), LinkedIn Internships, Turing, Microsoft Careers, Google Careers, IBM Careers, Cognizant Careers, HackerEarth Jobs, leading EdTech platforms. ",
    "If fewer than 5 unique platforms have results, allow duplicates from the most recent and relevant platforms to fill the list. ",
    "Return the output strictly as a clean JSON array of up to 5 internship objects, where each object contains only: ",
    "\"title\" (string), \"company\" (string), \"location\" (Remote/City), and \"link\" (valid HTTPS apply URL). ",
    "Do not include any extra information, summaries, explanations, headings, or formatting outside the JSON array."
);
